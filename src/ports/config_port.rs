//! Configuration access port trait.

use chrono::NaiveTime;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Session-clock values ("09:30", "15:55").
    fn get_time(&self, section: &str, key: &str) -> Option<NaiveTime> {
        self.get_string(section, key)
            .and_then(|s| NaiveTime::parse_from_str(s.trim(), "%H:%M").ok())
    }
}
