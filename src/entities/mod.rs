pub mod animal;
pub mod user;
pub mod weight_log;

pub use animal::Entity as Animal;
pub use user::Entity as User;
pub use weight_log::Entity as WeightLog;
