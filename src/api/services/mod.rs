pub mod health;
pub mod redirect;

pub use health::{HealthService, health_routes};
pub use redirect::{EdgeContext, RedirectService, TapQuery, redirect_routes};
