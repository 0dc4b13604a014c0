// Discord commands module.
// Each feature gets its own command file.

use crate::discord::{Data, Error};

pub mod channels;
pub mod courses;
pub mod embed_pages;
pub mod grade_format;
pub mod grades;
pub mod help;
pub mod school;

// Bot presence management
pub mod presence;

/// Every command the framework registers, in help order.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        school::setteachers(),
        school::setstudents(),
        school::addclass(),
        school::setsupervisor(),
        school::removesupervisor(),
        school::removeclass(),
        school::expel(),
        school::clearschool(),
        courses::course(),
        grades::grade(),
        grade_format::gradeformat(),
        channels::listchannel(),
        channels::classchannel(),
        channels::destroy(),
        help::help(),
    ]
}
