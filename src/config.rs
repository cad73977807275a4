// config.rs
#[derive(Debug, Clone)]
pub struct MatchPolicy {
    pub offer_cap: usize,
    pub fairness_window_hours: i32,
    pub penalty_per_assignment_minutes: i32,
    pub eta_same_landmark_minutes: i32,
    pub eta_same_area_minutes: i32,
    pub eta_same_village_minutes: i32,
    pub eta_unknown_minutes: i32,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        MatchPolicy {
            offer_cap: 5,
            fairness_window_hours: 24,
            penalty_per_assignment_minutes: 2,
            eta_same_landmark_minutes: 2,
            eta_same_area_minutes: 5,
            eta_same_village_minutes: 9,
            eta_unknown_minutes: 12,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    // Completion anchor endpoint; None disables anchoring entirely
    pub anchor_url: Option<String>,
    pub villages: Vec<String>,
    pub max_list: usize,
    pub match_policy: MatchPolicy,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8000);

        let anchor_url = std::env::var("ANCHOR_URL").ok().filter(|s| !s.is_empty());

        let villages = std::env::var("VILLAGES")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<String>>()
            })
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| vec!["Bumala".to_string(), "Busia".to_string(), "Other".to_string()]);

        let match_policy = MatchPolicy {
            offer_cap: env_usize("OFFER_CAP", 5),
            fairness_window_hours: env_i32("FAIRNESS_WINDOW_HOURS", 24),
            penalty_per_assignment_minutes: env_i32("FAIRNESS_PENALTY_MINUTES", 2),
            ..MatchPolicy::default()
        };

        Config {
            database_url,
            port,
            anchor_url,
            villages,
            max_list: env_usize("MAX_LIST", 10),
            match_policy,
        }
    }

}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_i32(key: &str, default: i32) -> i32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<i32>().ok())
        .unwrap_or(default)
}
