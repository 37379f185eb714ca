mod settings;

pub use settings::{ApiConfig, ClickConfig, ClickMatchMode, Settings, WelcomeNotificationConfig};
