use crate::calendar::parse_iso_date;
use crate::store::Row;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_GRADE: &str = "Grade 9";
pub const DEFAULT_KIND: &str = "client";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        Self::ALL[day.num_days_from_monday() as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    pub fn initial(self) -> char {
        self.name().chars().next().unwrap_or('?')
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(t))
            .ok_or_else(|| format!("unknown day: {}", t))
    }
}

impl TryFrom<String> for Weekday {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Weekday> for String {
    fn from(day: Weekday) -> Self {
        day.name().to_string()
    }
}

/// Time of day as minutes since midnight. Rows read back from the store may
/// carry seconds ("09:30:00") or off-grid minutes, so `FromStr` accepts any
/// valid clock time. Form input goes through `parse_slot` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self(hour * 60 + minute))
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }

    pub fn minutes(self) -> i64 {
        i64::from(self.0)
    }

    pub fn is_half_hour(self) -> bool {
        self.minute() == 30
    }

    /// One of the 48 form slots: `HH:00` or `HH:30`.
    pub fn parse_slot(s: &str) -> Result<Self, String> {
        let t: TimeOfDay = s.parse()?;
        if t.minute() == 0 || t.is_half_hour() {
            Ok(t)
        } else {
            Err(format!("time must be on the hour or half hour: {}", s.trim()))
        }
    }

    /// The 48 half-hour slots offered by the session form.
    pub fn options() -> Vec<TimeOfDay> {
        (0..48).map(|i| Self(i * 30)).collect()
    }

    /// The 24 hour rows of the weekly grid.
    pub fn hour_rows() -> Vec<TimeOfDay> {
        (0..24).map(|h| Self(h * 60)).collect()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let mut parts = t.split(':');
        let (Some(h), Some(m)) = (parts.next(), parts.next()) else {
            return Err(format!("time must be HH:MM: {}", t));
        };
        let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
        // Optional seconds component, as returned by SQL time columns.
        if let Some(sec) = parts.next() {
            let in_range = sec.parse::<u16>().map(|v| v <= 59).unwrap_or(false);
            if sec.len() != 2 || !digits(sec) || !in_range {
                return Err(format!("time must be HH:MM: {}", t));
            }
        }
        if parts.next().is_some() || h.len() > 2 || m.len() != 2 || !digits(h) || !digits(m) {
            return Err(format!("time must be HH:MM: {}", t));
        }
        let hour = h
            .parse::<u16>()
            .map_err(|_| format!("time hour must be numeric: {}", t))?;
        let minute = m
            .parse::<u16>()
            .map_err(|_| format!("time minute must be numeric: {}", t))?;
        Self::from_hm(hour, minute).ok_or_else(|| format!("time out of range: {}", t))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}

/// Per-occurrence lesson state. An occurrence with no stored record is
/// `Scheduled`; only `taught` and `paid` are ever written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LessonStatus {
    #[serde(rename = "scheduled")]
    Scheduled,
    #[serde(rename = "taught")]
    TaughtUnpaid,
    #[serde(rename = "paid")]
    Paid,
}

impl LessonStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LessonStatus::Scheduled => "scheduled",
            LessonStatus::TaughtUnpaid => "taught",
            LessonStatus::Paid => "paid",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Some(LessonStatus::Scheduled),
            "taught" => Some(LessonStatus::TaughtUnpaid),
            "paid" => Some(LessonStatus::Paid),
            _ => None,
        }
    }

    /// Next state in the lifecycle. Paid is final; nothing moves backwards.
    pub fn advance(self) -> Self {
        match self {
            LessonStatus::Scheduled => LessonStatus::TaughtUnpaid,
            LessonStatus::TaughtUnpaid | LessonStatus::Paid => LessonStatus::Paid,
        }
    }
}

/// Lenient currency read: numbers as-is, numeric strings parsed, and
/// anything else (null, garbage, NaN) counts as zero.
pub fn parse_amount(value: Option<&JsonValue>) -> f64 {
    let v = match value {
        Some(JsonValue::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(JsonValue::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn row_str(row: &Row, key: &str) -> Option<String> {
    match row.get(key) {
        Some(JsonValue::String(s)) => Some(s.clone()),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn row_required_str(row: &Row, key: &str) -> Result<String, String> {
    row_str(row, key).ok_or_else(|| format!("missing {}", key))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub day: Weekday,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub grade: String,
    pub payment_amount: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub added_date: Option<String>,
}

impl Session {
    /// Decode a `schedule` row. Day and times are structural; a row
    /// without them cannot be placed on the grid and is rejected. The amount
    /// never rejects a row.
    pub fn from_row(row: &Row) -> Result<Self, String> {
        let id = row_required_str(row, "id")?;
        let day = row_required_str(row, "day")?.parse::<Weekday>()?;
        let start_time = row_required_str(row, "start_time")?.parse::<TimeOfDay>()?;
        let end_time = row_required_str(row, "end_time")?.parse::<TimeOfDay>()?;
        Ok(Self {
            id,
            name: row_str(row, "name").unwrap_or_default(),
            phone: row_str(row, "phone").unwrap_or_default(),
            email: row_str(row, "email").filter(|s| !s.trim().is_empty()),
            day,
            start_time,
            end_time,
            grade: row_str(row, "grade").unwrap_or_default(),
            payment_amount: parse_amount(row.get("payment_amount")),
            kind: row_str(row, "type").unwrap_or_else(|| DEFAULT_KIND.to_string()),
            added_date: row_str(row, "added_date"),
        })
    }

    /// Zero when the end is not after the start.
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time.minutes() - self.start_time.minutes()).max(0)
    }

    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }
}

/// One dated occurrence of a session that reached Taught or Paid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub id: String,
    pub session_id: String,
    pub client_name: String,
    pub amount: f64,
    #[serde(rename = "date")]
    pub raw_date: String,
    #[serde(skip)]
    pub date: Option<NaiveDate>,
    pub status: LessonStatus,
}

impl Occurrence {
    pub fn from_row(row: &Row) -> Result<Self, String> {
        let id = row_required_str(row, "id")?;
        let status_raw = row_required_str(row, "status")?;
        let status = LessonStatus::parse(&status_raw)
            .ok_or_else(|| format!("unknown status: {}", status_raw))?;
        let raw_date = row_str(row, "date").unwrap_or_default();
        Ok(Self {
            id,
            session_id: row_str(row, "client_id").unwrap_or_default(),
            client_name: row_str(row, "client_name").unwrap_or_default(),
            amount: parse_amount(row.get("amount")),
            date: parse_iso_date(&raw_date),
            raw_date,
            status,
        })
    }

    pub fn is_on(&self, date: NaiveDate) -> bool {
        self.date == Some(date)
    }

    /// Row written when a session is marked taught on `date`.
    pub fn taught_row(session: &Session, date: NaiveDate) -> Row {
        let mut row = Row::new();
        row.insert("client_id".into(), json!(session.id));
        row.insert("client_name".into(), json!(session.name));
        row.insert("amount".into(), json!(session.payment_amount));
        row.insert("status".into(), json!(LessonStatus::TaughtUnpaid.as_str()));
        row.insert("date".into(), json!(crate::calendar::format_iso_date(date)));
        row
    }
}

fn de_amount_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = JsonValue::deserialize(deserializer)?;
    Ok(match v {
        JsonValue::String(s) => s,
        JsonValue::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn de_slot<'de, D>(deserializer: D) -> Result<TimeOfDay, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    TimeOfDay::parse_slot(&raw).map_err(serde::de::Error::custom)
}

fn de_opt_slot<'de, D>(deserializer: D) -> Result<Option<TimeOfDay>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => TimeOfDay::parse_slot(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn de_opt_amount_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<JsonValue>::deserialize(deserializer)? {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::String(s)) => Some(s),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        Some(_) => Some(String::new()),
    })
}

/// Amounts that do not parse are written as typed; readers treat them as zero.
fn amount_value(raw: &str) -> JsonValue {
    let raw = raw.trim();
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => json!(v),
        _ => json!(raw),
    }
}

fn email_value(raw: &str) -> JsonValue {
    let email = raw.trim();
    if email.is_empty() {
        JsonValue::Null
    } else {
        json!(email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required fields: {}", .missing.join(", "))]
pub struct DraftError {
    pub missing: Vec<&'static str>,
}

/// Create/edit form contents as typed by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionDraft {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub day: Weekday,
    #[serde(deserialize_with = "de_slot")]
    pub start_time: TimeOfDay,
    #[serde(deserialize_with = "de_slot")]
    pub end_time: TimeOfDay,
    pub grade: String,
    #[serde(deserialize_with = "de_amount_text")]
    pub payment_amount: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Default for SessionDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            phone: String::new(),
            email: String::new(),
            day: Weekday::Monday,
            start_time: TimeOfDay(9 * 60),
            end_time: TimeOfDay(10 * 60),
            grade: DEFAULT_GRADE.to_string(),
            payment_amount: String::new(),
            kind: DEFAULT_KIND.to_string(),
        }
    }
}

impl SessionDraft {
    pub fn from_session(s: &Session) -> Self {
        Self {
            name: s.name.clone(),
            phone: s.phone.clone(),
            email: s.email.clone().unwrap_or_default(),
            day: s.day,
            start_time: s.start_time,
            end_time: s.end_time,
            grade: s.grade.clone(),
            payment_amount: s.payment_amount.to_string(),
            kind: s.kind.clone(),
        }
    }

    /// Required-field presence only. Reports every missing field at once.
    pub fn validate(&self) -> Result<(), DraftError> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.phone.trim().is_empty() {
            missing.push("phone");
        }
        if self.payment_amount.trim().is_empty() {
            missing.push("paymentAmount");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DraftError { missing })
        }
    }

    /// Store row in the `schedule` column layout.
    pub fn to_row(&self) -> Row {
        SessionPatch::from(self).to_row()
    }
}

/// Edit of an existing session. Only the fields present are written; the
/// rest of the stored row is left as it is.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub day: Option<Weekday>,
    #[serde(default, deserialize_with = "de_opt_slot")]
    pub start_time: Option<TimeOfDay>,
    #[serde(default, deserialize_with = "de_opt_slot")]
    pub end_time: Option<TimeOfDay>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default, deserialize_with = "de_opt_amount_text")]
    pub payment_amount: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl From<&SessionDraft> for SessionPatch {
    fn from(d: &SessionDraft) -> Self {
        Self {
            name: Some(d.name.clone()),
            phone: Some(d.phone.clone()),
            email: Some(d.email.clone()),
            day: Some(d.day),
            start_time: Some(d.start_time),
            end_time: Some(d.end_time),
            grade: Some(d.grade.clone()),
            payment_amount: Some(d.payment_amount.clone()),
            kind: Some(d.kind.clone()),
        }
    }
}

impl SessionPatch {
    pub fn is_empty(&self) -> bool {
        self.to_row().is_empty()
    }

    /// Required fields may be left out, but not blanked.
    pub fn validate(&self) -> Result<(), DraftError> {
        let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.trim().is_empty());
        let mut missing = Vec::new();
        if blank(&self.name) {
            missing.push("name");
        }
        if blank(&self.phone) {
            missing.push("phone");
        }
        if blank(&self.payment_amount) {
            missing.push("paymentAmount");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DraftError { missing })
        }
    }

    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        if let Some(v) = &self.name {
            row.insert("name".into(), json!(v.trim()));
        }
        if let Some(v) = &self.phone {
            row.insert("phone".into(), json!(v.trim()));
        }
        if let Some(v) = &self.email {
            row.insert("email".into(), email_value(v));
        }
        if let Some(v) = self.day {
            row.insert("day".into(), json!(v.name()));
        }
        if let Some(v) = self.start_time {
            row.insert("start_time".into(), json!(v.to_string()));
        }
        if let Some(v) = self.end_time {
            row.insert("end_time".into(), json!(v.to_string()));
        }
        if let Some(v) = &self.grade {
            row.insert("grade".into(), json!(v.trim()));
        }
        if let Some(v) = &self.payment_amount {
            row.insert("payment_amount".into(), amount_value(v));
        }
        if let Some(v) = &self.kind {
            row.insert("type".into(), json!(v.trim()));
        }
        row
    }
}
