//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for every storefront and hostess flow.
//! Front ends show [`AppError::user_message`] to the user and call
//! [`AppError::report`] so unexpected failures reach Sentry.

use luma_core::{CartError, EmailError};
use thiserror::Error;

use crate::api::ApiError;
use crate::checkin::ScannerError;
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local persistence failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Cart mutation rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Email address rejected before reaching the backend.
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    /// The user is logged in but lacks the required group.
    #[error("Permission denied")]
    PermissionDenied,

    /// The check-in roster of an event could not be loaded.
    #[error("Event data unavailable: {0}")]
    EventUnavailable(#[source] ApiError),

    /// Checkout was started with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The check-in screen was left before its data arrived.
    #[error("Check-in screen was left")]
    ViewLeft,

    /// Scanning was requested but nobody is left to check in.
    #[error("No attendees pending check-in")]
    ScanUnavailable,

    /// The scanning surface could not be acquired or failed.
    #[error("Scanner error: {0}")]
    Scanner(#[from] ScannerError),
}

/// How the front end should react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credentials are gone or rejected: send the user to login.
    Session,
    /// Show an access-denied notice.
    Permission,
    /// A request failed; the user may try again.
    Request,
    /// The user's input was rejected locally.
    InvalidInput,
    /// Unexpected failure, reported to Sentry.
    Internal,
}

impl AppError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Api(err) => match err {
                ApiError::NotAuthenticated | ApiError::SessionExpired => ErrorKind::Session,
                ApiError::PermissionDenied(_) => ErrorKind::Permission,
                ApiError::Http(_) | ApiError::Status { .. } => ErrorKind::Request,
                ApiError::Parse(_) | ApiError::InvalidUrl(_) | ApiError::Storage(_) => {
                    ErrorKind::Internal
                }
            },
            Self::PermissionDenied => ErrorKind::Permission,
            Self::Cart(_) | Self::Email(_) | Self::EmptyCart | Self::ScanUnavailable => {
                ErrorKind::InvalidInput
            }
            Self::EventUnavailable(_) | Self::Scanner(_) | Self::ViewLeft => ErrorKind::Request,
            Self::Config(_) | Self::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Localized (pt-BR) text to show the user.
    ///
    /// Messages sent by the backend are passed through as-is.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(ApiError::NotAuthenticated) => {
                "Você precisa estar logado para continuar.".to_string()
            }
            Self::Api(ApiError::SessionExpired) => {
                "Sua sessão expirou. Faça login novamente.".to_string()
            }
            Self::Api(ApiError::Http(_)) => {
                "Não foi possível conectar ao servidor. Tente novamente.".to_string()
            }
            Self::Api(ApiError::Status { message, .. }) => message.clone().unwrap_or_else(|| {
                "Não foi possível concluir a operação. Tente novamente.".to_string()
            }),
            Self::Api(ApiError::PermissionDenied(_)) | Self::PermissionDenied => {
                "Você não tem permissão para acessar esta área.".to_string()
            }
            Self::Cart(CartError::InvalidQuantity) => {
                "A quantidade deve ser de pelo menos 1 ingresso.".to_string()
            }
            Self::Cart(CartError::NegativePrice(_)) => "Preço de ingresso inválido.".to_string(),
            Self::Email(_) => "Informe um endereço de e-mail válido.".to_string(),
            Self::EventUnavailable(_) => {
                "Falha ao carregar dados do evento. Tente novamente.".to_string()
            }
            Self::EmptyCart => "Seu carrinho está vazio.".to_string(),
            Self::ScanUnavailable => {
                "Todos os participantes já fizeram check-in.".to_string()
            }
            Self::Scanner(_) => "Não foi possível acessar a câmera.".to_string(),
            Self::ViewLeft => "Check-in cancelado.".to_string(),
            _ => "Ocorreu um erro inesperado. Tente novamente.".to_string(),
        }
    }

    /// Send unexpected failures to Sentry and log them.
    ///
    /// Session, permission, and input errors are ordinary outcomes and are
    /// not reported.
    pub fn report(&self) {
        let server_error =
            matches!(self, Self::Api(ApiError::Status { status, .. }) if *status >= 500);

        if self.kind() == ErrorKind::Internal || server_error {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Unexpected error"
            );
        } else {
            tracing::debug!(error = %self, kind = ?self.kind(), "Handled error");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
