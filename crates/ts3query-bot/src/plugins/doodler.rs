//! Swaps the virtual server banner on configured dates.
//!
//! ```toml
//! [plugins.doodler]
//! default = "https://example.org/banner.png"
//!
//! [[plugins.doodler.doodles]]
//! date = "25-12-2025"
//! url = "https://example.org/christmas.png"
//!
//! [[plugins.doodler.doodles]]
//! start_date = "01-01-2026"
//! end_date = "07-01-2026"
//! url = "https://example.org/new-year.png"
//! ```

use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ts3query_client::Ts3Client;

use crate::error::BotError;
use crate::plugin::{Plugin, PluginContext, PluginResult, QueryStream, tolerate};

pub const NAME: &str = "doodler";

/// Date format used in the config.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

const BANNER_PROPERTY: &str = "virtualserver_hostbanner_gfx_url";

/// Banner mode "adjust, keep aspect".
const BANNER_MODE: &str = "2";

/// Either a single day or an inclusive range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DoodleDates {
    Single {
        date: String,
    },
    Range {
        #[serde(alias = "startDate")]
        start_date: String,
        #[serde(alias = "endDate")]
        end_date: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoodleConfig {
    pub url: String,
    #[serde(flatten)]
    pub dates: DoodleDates,
}

/// `[plugins.doodler]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoodlerConfig {
    /// Banner outside every doodle date.
    pub default: String,

    #[serde(default)]
    pub doodles: Vec<DoodleConfig>,
}

impl DoodlerConfig {
    pub fn validate(&self) -> PluginResult<()> {
        self.schedule().map(|_| ())
    }

    fn schedule(&self) -> PluginResult<Vec<Doodle>> {
        self.doodles.iter().map(Doodle::try_from).collect()
    }
}

/// A parsed doodle.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Doodle {
    url: String,
    start: NaiveDate,
    end: NaiveDate,
}

impl Doodle {
    fn covers(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

fn parse_date(value: &str) -> PluginResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        BotError::plugin(NAME, format!("invalid date {value:?}, expected dd-mm-YYYY: {e}"))
    })
}

impl TryFrom<&DoodleConfig> for Doodle {
    type Error = BotError;

    fn try_from(config: &DoodleConfig) -> PluginResult<Self> {
        let (start, end) = match &config.dates {
            DoodleDates::Single { date } => {
                let day = parse_date(date)?;
                (day, day)
            }
            DoodleDates::Range { start_date, end_date } => (parse_date(start_date)?, parse_date(end_date)?),
        };
        if end < start {
            return Err(BotError::plugin(
                NAME,
                format!("doodle {} ends before it starts", config.url),
            ));
        }
        Ok(Self {
            url: config.url.clone(),
            start,
            end,
        })
    }
}

/// Time left until the next local midnight.
fn until_midnight(now: NaiveDateTime) -> Duration {
    now.date()
        .succ_opt()
        .map(|tomorrow| tomorrow.and_time(NaiveTime::MIN) - now)
        .and_then(|delta| delta.to_std().ok())
        .unwrap_or(Duration::from_secs(60 * 60))
}

pub struct Doodler {
    default: String,
    doodles: Vec<Doodle>,
}

impl Doodler {
    pub fn new(config: &DoodlerConfig) -> PluginResult<Self> {
        Ok(Self {
            default: config.default.clone(),
            doodles: config.schedule()?,
        })
    }

    /// First doodle covering `day`, or the default banner.
    pub fn banner_for(&self, day: NaiveDate) -> &str {
        self.doodles
            .iter()
            .find(|doodle| doodle.covers(day))
            .map_or(self.default.as_str(), |doodle| doodle.url.as_str())
    }

    /// Applies the banner for `day`. Returns true if it had to change.
    pub(crate) async fn tick<S: QueryStream>(
        &self,
        client: &Ts3Client<S>,
        day: NaiveDate,
    ) -> PluginResult<bool> {
        let wanted = self.banner_for(day);
        let current = client.server_info().await?.virtualserver_hostbanner_gfx_url;
        if current.as_deref() == Some(wanted) {
            debug!(banner = wanted, "banner already set");
            return Ok(false);
        }

        info!(banner = wanted, "setting server banner");
        client
            .edit_server(&[(BANNER_PROPERTY, wanted), ("virtualserver_hostbanner_mode", BANNER_MODE)])
            .await?;
        Ok(true)
    }

    async fn run_loop<S: QueryStream>(self, ctx: PluginContext<S>) -> PluginResult<()> {
        info!(doodles = self.doodles.len(), "doodler started");

        while !ctx.is_shutdown() {
            let now = Local::now().naive_local();
            if let Err(err) = self.tick(ctx.client(), now.date()).await {
                tolerate(NAME, err)?;
            }
            if !ctx.sleep(until_midnight(now)).await {
                break;
            }
        }
        Ok(())
    }
}

impl<S: QueryStream> Plugin<S> for Doodler {
    fn name(&self) -> &'static str {
        NAME
    }

    fn run(self: Box<Self>, ctx: PluginContext<S>) -> BoxFuture<'static, PluginResult<()>> {
        Box::pin(self.run_loop(ctx))
    }
}

#[cfg(test)]
mod tests {
    use ts3query_client::test_support::{FakeServer, ok};

    use super::*;
    use crate::testing::client;

    fn day(value: &str) -> NaiveDate {
        parse_date(value).unwrap()
    }

    fn config() -> DoodlerConfig {
        toml::from_str(
            r#"
            default = "https://example.org/banner.png"

            [[doodles]]
            date = "25-12-2025"
            url = "https://example.org/christmas.png"

            [[doodles]]
            startDate = "30-12-2025"
            endDate = "02-01-2026"
            url = "https://example.org/new-year.png"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn picks_banner_by_date() {
        let doodler = Doodler::new(&config()).unwrap();
        assert_eq!(doodler.banner_for(day("25-12-2025")), "https://example.org/christmas.png");
        assert_eq!(doodler.banner_for(day("26-12-2025")), "https://example.org/banner.png");
        assert_eq!(doodler.banner_for(day("30-12-2025")), "https://example.org/new-year.png");
        assert_eq!(doodler.banner_for(day("01-01-2026")), "https://example.org/new-year.png");
        assert_eq!(doodler.banner_for(day("02-01-2026")), "https://example.org/new-year.png");
        assert_eq!(doodler.banner_for(day("03-01-2026")), "https://example.org/banner.png");
    }

    #[test]
    fn rejects_bad_dates() {
        let mut iso = config();
        iso.doodles.push(DoodleConfig {
            url: "x".into(),
            dates: DoodleDates::Single {
                date: "2025-12-25".into(),
            },
        });
        assert!(iso.validate().is_err());

        let mut reversed = config();
        reversed.doodles.push(DoodleConfig {
            url: "x".into(),
            dates: DoodleDates::Range {
                start_date: "05-01-2026".into(),
                end_date: "01-01-2026".into(),
            },
        });
        assert!(Doodler::new(&reversed).is_err());
    }

    #[test]
    fn sleeps_until_midnight() {
        let now = day("25-12-2025").and_hms_opt(21, 30, 0).unwrap();
        assert_eq!(until_midnight(now), Duration::from_secs(2 * 60 * 60 + 30 * 60));
    }

    #[tokio::test]
    async fn edits_banner_only_when_different() {
        let (client, server) = client(FakeServer::new(|line: &str| {
            if line == "serverinfo" {
                Some(ok("virtualserver_id=1 virtualserver_hostbanner_gfx_url=https:\\/\\/example.org\\/banner.png"))
            } else {
                Some(ok(""))
            }
        }))
        .await;
        let doodler = Doodler::new(&config()).unwrap();

        assert!(!doodler.tick(&client, day("26-12-2025")).await.unwrap());
        assert!(doodler.tick(&client, day("25-12-2025")).await.unwrap());

        assert_eq!(
            server.received(),
            [
                "serverinfo",
                "serverinfo",
                "serveredit virtualserver_hostbanner_gfx_url=https:\\/\\/example.org\\/christmas.png virtualserver_hostbanner_mode=2",
            ]
        );
    }
}
