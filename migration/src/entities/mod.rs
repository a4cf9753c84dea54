pub mod band;
pub mod event;
pub mod tap_log;
pub mod window;

pub use band::Entity as BandEntity;
pub use event::Entity as EventEntity;
pub use tap_log::Entity as TapLogEntity;
pub use window::Entity as WindowEntity;
