use model::{
    errors::ValidationError,
    ids::{TemplateId, TrainingId},
    template::TrainingTemplate,
    time::parse_time,
    training::RealTraining,
};
use storage::cache::{QueryCache, QueryKey};

pub mod assignments;
pub mod attendance;
pub mod calendar;
pub mod notification;
pub mod templates;
pub mod trainings;

fn cached_training(cache: &QueryCache, key: &QueryKey, id: TrainingId) -> Option<RealTraining> {
    cache
        .get(key)?
        .real_trainings()?
        .iter()
        .find(|training| training.id == id)
        .cloned()
}

fn cached_template(cache: &QueryCache, id: TemplateId) -> Option<TrainingTemplate> {
    cache
        .get(&QueryKey::Templates)?
        .templates()?
        .iter()
        .find(|template| template.id == id)
        .cloned()
}

fn validate_time(start_time: &str) -> Result<(), ValidationError> {
    parse_time(start_time)
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidTime(start_time.to_owned()))
}

fn validate_day_number(day_number: u8) -> Result<(), ValidationError> {
    if !(1..=7).contains(&day_number) {
        return Err(ValidationError::InvalidDayNumber(day_number));
    }
    Ok(())
}
