//! Key performance indicators reported per arm, and the junction-wide score
//! used to compare configurations.

/// Expected average wait in seconds; an arm at this value scores half marks
const AVERAGE_WAIT_SCALE: f64 = 20.0;
/// Expected maximum wait in seconds
const MAX_WAIT_SCALE: f64 = 60.0;
/// Expected maximum queue length in vehicles
const MAX_QUEUE_SCALE: f64 = 30.0;

/// Performance of one arm, including vehicles still queued when it was taken
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmKpi {
    /// Mean time vehicles spent held, in seconds, rounded to two decimals
    pub average_wait_s: f64,
    /// Longest time any vehicle spent held, in seconds
    pub max_wait_s: f64,
    /// Longest queue seen in any lane of the arm
    pub max_queue_length: usize,
}

impl ArmKpi {
    /// Builds the KPI from raw totals; zero vehicles gives a zero average
    pub fn from_totals(
        total_wait_ms: u64,
        vehicle_count: u64,
        max_wait_ms: u64,
        max_queue_length: usize,
    ) -> Self {
        let average_wait_ms = if vehicle_count == 0 {
            0.0
        } else {
            total_wait_ms as f64 / vehicle_count as f64
        };
        Self {
            average_wait_s: round_to_hundredths(average_wait_ms / 1000.0),
            max_wait_s: round_to_hundredths(max_wait_ms as f64 / 1000.0),
            max_queue_length,
        }
    }
}

/// Relative importance of each KPI in [`efficiency_score`]; should sum to 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpiWeights {
    pub average_wait: f64,
    pub max_wait: f64,
    pub max_queue: f64,
}

impl Default for KpiWeights {
    fn default() -> Self {
        Self {
            average_wait: 1.0 / 3.0,
            max_wait: 1.0 / 3.0,
            max_queue: 1.0 / 3.0,
        }
    }
}

/// Junction-wide efficiency out of 100. A junction where nobody waits and no
/// queue forms scores exactly 100.
pub fn efficiency_score(kpis: &[ArmKpi], weights: KpiWeights) -> f64 {
    if kpis.is_empty() {
        return 0.0;
    }
    let raw: f64 = kpis
        .iter()
        .map(|kpi| {
            weights.average_wait / (1.0 + kpi.average_wait_s / AVERAGE_WAIT_SCALE)
                + weights.max_wait / (1.0 + kpi.max_wait_s / MAX_WAIT_SCALE)
                + weights.max_queue / (1.0 + kpi.max_queue_length as f64 / MAX_QUEUE_SCALE)
        })
        .sum();
    raw * 100.0 / kpis.len() as f64
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
