//! Countdown, quote of the day, and repeating background tasks.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Time left until a target instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Countdown {
    /// Time from `now` until `target`, zero once the target has passed.
    pub fn until(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let total = (target - now).num_seconds().max(0);
        Self {
            days: total / 86_400,
            hours: total % 86_400 / 3_600,
            minutes: total % 3_600 / 60,
            seconds: total % 60,
        }
    }

    pub fn is_over(&self) -> bool {
        *self == Self::default()
    }
}

impl std::fmt::Display for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} days left {}h {}m {}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub text: &'static str,
    pub author: &'static str,
}

pub const QUOTES: &[Quote] = &[
    Quote {
        text: "Success is the sum of small efforts, repeated day in and day out.",
        author: "Robert Collier",
    },
    Quote {
        text: "The harder you work for something, the greater you'll feel when you achieve it.",
        author: "Unknown",
    },
    Quote {
        text: "Believe you can and you're halfway there.",
        author: "Theodore Roosevelt",
    },
    Quote {
        text: "The only way to do great work is to love what you do.",
        author: "Steve Jobs",
    },
    Quote {
        text: "You are never too old to set another goal or to dream a new dream.",
        author: "C.S. Lewis",
    },
    Quote {
        text: "Your future is created by what you do today, not tomorrow.",
        author: "Robert Kiyosaki",
    },
    Quote {
        text: "The secret to getting ahead is getting started.",
        author: "Mark Twain",
    },
    Quote {
        text: "The only limit to our realization of tomorrow will be our doubts of today.",
        author: "Franklin D. Roosevelt",
    },
    Quote {
        text: "Don't watch the clock; do what it does. Keep going.",
        author: "Sam Levenson",
    },
    Quote {
        text: "Success is not the key to happiness. Happiness is the key to success.",
        author: "Albert Schweitzer",
    },
    Quote {
        text: "The journey of a thousand miles begins with one step.",
        author: "Lao Tzu",
    },
    Quote {
        text: "Work hard in silence; let success make the noise.",
        author: "Unknown",
    },
    Quote {
        text: "Dreams don't work unless you do.",
        author: "John C. Maxwell",
    },
    Quote {
        text: "The only person you should try to be better than is the person you were yesterday.",
        author: "Unknown",
    },
    Quote {
        text: "Don't count the days; make the days count.",
        author: "Muhammad Ali",
    },
    Quote {
        text: "The future depends on what you do today.",
        author: "Mahatma Gandhi",
    },
];

/// Day the quote rotation starts from.
fn rotation_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default()
}

/// Index of the quote shown on `today`: whole days since 2023-01-01 modulo
/// the number of quotes.
pub fn quote_index(today: NaiveDate, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    let days = (today - rotation_epoch()).num_days();
    days.rem_euclid(count as i64) as usize
}

pub fn quote_of_the_day(today: NaiveDate) -> &'static Quote {
    &QUOTES[quote_index(today, QUOTES.len())]
}

/// A closure run on a fixed interval until the task is dropped.
pub struct RepeatingTask {
    handle: JoinHandle<()>,
}

impl RepeatingTask {
    /// Spawn `tick` every `period`. The first tick fires immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick().await;
            }
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
