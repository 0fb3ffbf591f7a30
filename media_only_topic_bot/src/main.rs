use bot_commons::start_everything;
use media_only_topic_bot::{entry, Settings, StartupError};

fn main() -> Result<(), StartupError> {
    let settings = Settings::load()?;
    start_everything(settings.logger_config(), entry(settings))
}
