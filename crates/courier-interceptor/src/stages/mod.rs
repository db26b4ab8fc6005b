//! Built-in interceptors.
//!
//! | Interceptor | Purpose |
//! |---|---|
//! | [`AuthInterceptor`](auth::AuthInterceptor) | Inject a credential header from an async provider |
//! | [`LoggingInterceptor`](logging::LoggingInterceptor) | Log requests and responses at a chosen verbosity |

pub mod auth;
pub mod logging;
