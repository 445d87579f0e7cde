pub mod dispatch;
pub mod health;
pub mod targets;

use chrono::{SecondsFormat, Utc};

/// 响应中的时间戳，UTC，精确到秒
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
