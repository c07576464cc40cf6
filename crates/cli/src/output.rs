//! Terminal rendering.
//!
//! All stdout and stderr writes of the CLI live here.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use chrono::{DateTime, Utc};
use luma_core::{
    Attendee, Cart, Event, EventStats, Price, Ticket, UserProfile, format_date, format_date_time,
};
use luma_storefront::checkin::{CheckInOutcome, NoticeLevel};

pub fn error(message: &str) {
    eprintln!("erro: {message}");
}

pub fn line(text: &str) {
    println!("{text}");
}

pub fn prompt(text: &str) {
    eprint!("{text}");
}

pub fn user(profile: &UserProfile) {
    println!("{} (#{})", profile.username, profile.id);
    if !profile.email.is_empty() {
        println!("  e-mail: {}", profile.email);
    }
    if !profile.groups.is_empty() {
        println!("  grupos: {}", profile.groups.join(", "));
    }
}

pub fn events(events: &[&Event]) {
    if events.is_empty() {
        println!("Nenhum evento encontrado.");
        return;
    }
    for event in events {
        println!(
            "#{} {}  {}  {}  a partir de {}",
            event.id,
            format_date(event.date),
            event.title,
            event.city,
            Price::brl(event.price),
        );
        for ticket in &event.tickets {
            println!("        ingresso #{} {} {}", ticket.id, ticket.name, Price::brl(ticket.price));
        }
    }
}

pub fn tickets(tickets: &[Ticket]) {
    if tickets.is_empty() {
        println!("Você ainda não tem ingressos.");
        return;
    }
    for ticket in tickets {
        let status = check_in_status(ticket.checked_in, ticket.check_in_time);
        println!(
            "#{} {} ({}) {}  [{}]",
            ticket.id,
            ticket.event_title,
            ticket.ticket_name,
            format_date_time(ticket.event_date),
            status,
        );
        println!("        QR: {}", ticket.qr_payload());
    }
}

pub fn cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Seu carrinho está vazio.");
        return;
    }
    for item in cart.items() {
        println!(
            "{}  {} - {} x{}  {}",
            item.id,
            item.event_title,
            item.ticket_name,
            item.quantity,
            Price::brl(item.line_total()),
        );
    }
    println!("Ingressos:       {}", cart.ticket_count());
    println!("Subtotal:        {}", Price::brl(cart.subtotal()));
    println!("Taxa de serviço: {}", Price::brl(cart.platform_fee()));
    println!("Total:           {}", Price::brl(cart.total()));
}

pub fn stats(stats: EventStats) {
    println!(
        "Check-ins: {} de {}",
        stats.checked_in, stats.total
    );
}

pub fn roster(attendees: &[&Attendee]) {
    if attendees.is_empty() {
        println!("Nenhum participante encontrado.");
        return;
    }
    for attendee in attendees {
        let status = check_in_status(attendee.checked_in, attendee.check_in_time);
        println!("#{} {:<30} {}", attendee.id, attendee.user_name, status);
    }
}

fn check_in_status(checked_in: bool, at: Option<DateTime<Utc>>) -> String {
    match (checked_in, at) {
        (true, Some(at)) => format!("check-in {}", format_date_time(at)),
        (true, None) => "check-in feito".to_string(),
        (false, _) => "pendente".to_string(),
    }
}

pub fn outcome(outcome: &CheckInOutcome) {
    let Some(notice) = outcome.notice() else {
        return;
    };
    match notice.level {
        NoticeLevel::Success => println!("✔ {}", notice.text),
        NoticeLevel::Info => println!("• {}", notice.text),
        NoticeLevel::Error => println!("✘ {}", notice.text),
    }
}
