use chrono::{Duration as TimeDelta, NaiveDateTime, NaiveTime, Timelike};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

///////////////////////////////////////////////////////////////////////////////////////////////////
//
// When a job fires
//
///////////////////////////////////////////////////////////////////////////////////////////////////

/// Wall-clock trigger, evaluated in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Every hour at `minute` past (cron `M * * * *`).
    Hourly { minute: u32 },
    /// Every day at `hour:minute` (cron `M H * * *`).
    Daily { hour: u32, minute: u32 },
}

impl Schedule {
    /// Stock quotes: on the hour.
    pub const STOCK_QUOTES: Schedule = Schedule::Hourly { minute: 0 };
    /// Exchange rate: once a day at 05:00.
    pub const EXCHANGE_RATE: Schedule = Schedule::Daily { hour: 5, minute: 0 };

    /// First tick strictly after `now`.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        match *self {
            Schedule::Hourly { minute } => {
                let tick = now.date().and_time(at(now.hour(), minute));
                if tick > now {
                    tick
                } else {
                    tick + TimeDelta::hours(1)
                }
            }
            Schedule::Daily { hour, minute } => {
                let tick = now.date().and_time(at(hour, minute));
                if tick > now {
                    tick
                } else {
                    tick + TimeDelta::days(1)
                }
            }
        }
    }
}

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour % 24, minute % 60, 0).unwrap_or(NaiveTime::MIN)
}

///////////////////////////////////////////////////////////////////////////////////////////////////
//
// Retries
//
///////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub retries: u32,
    /// Wait before the first retry.
    pub delay: Duration,
    /// Multiplier applied to `delay` for each later retry; 1.0 keeps it fixed.
    pub backoff: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            delay: Duration::from_secs(120),
            backoff: 1.0,
        }
    }
}

impl RetryPolicy {
    /// Wait before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1) as i32;
        self.delay.mul_f64(self.backoff.max(0.0).powi(exponent))
    }

    /// Run `job` until it succeeds or the retries are spent; the last error is returned.
    pub async fn run<F, Fut, T>(&self, name: &str, mut job: F) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut retry = 0;
        loop {
            match job().await {
                Ok(output) => return Ok(output),
                Err(e) if retry < self.retries => {
                    retry += 1;
                    let delay = self.delay_for(retry);
                    warn!(
                        "{name} failed: {e}; retry {retry}/{} in {:.1}s",
                        self.retries,
                        delay.as_secs_f64()
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////
//
// Job loop
//
///////////////////////////////////////////////////////////////////////////////////////////////////

/// Run `job` on every tick of `schedule`, forever. Failures are logged and the
/// loop waits for the next tick.
#[instrument(skip(schedule, policy, job))]
pub async fn run_job<F, Fut>(name: &str, schedule: Schedule, policy: RetryPolicy, mut job: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    info!("Starting {name} job: {schedule:?}, {policy:?}");

    let mut iteration = 0u64;
    loop {
        let now = chrono::Local::now().naive_local();
        let next = schedule.next_after(now);
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        info!("{name}: next run at {next} (in {}s)", wait.as_secs());
        sleep(wait).await;

        iteration += 1;
        let started = std::time::Instant::now();
        match policy.run(name, &mut job).await {
            Ok(()) => info!(
                iteration,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "{name}: run completed"
            ),
            Err(e) => error!(iteration, "{name}: run failed after retries: {e}"),
        }
    }
}
