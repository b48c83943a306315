//! Transaction ledger for an account subtree
//!
//! Builds a time-sorted view of an account's `transactions` array with a
//! running balance. The view is computed from a detached snapshot and keeps
//! no references into the document.

use chrono::{Local, NaiveDateTime, TimeZone, Utc};

use crate::document::Document;
use crate::error::{KeepsakeError, KeepsakeResult};

/// Member of an account holding its transactions
pub const TRANSACTIONS_KEY: &str = "transactions";

/// Stored transaction date format
pub const INPUT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Displayed transaction date format
pub const DISPLAY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single ledger row
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// Transaction time; `None` when missing or unparseable
    pub date_time: Option<NaiveDateTime>,
    /// Amount; positive values are debits
    pub value: f64,
    /// Free-text reference
    pub reference: String,
    /// Balance after this transaction
    pub running_balance: f64,
    /// Description of missing or malformed fields
    pub error: Option<String>,
}

impl TransactionRecord {
    fn parse(raw: &serde_json::Value) -> Self {
        let mut problems = Vec::new();
        let fields = raw.as_object();
        if fields.is_none() {
            problems.push("not an object".to_string());
        }
        let field = |name: &str| fields.and_then(|f| f.get(name));

        let date_time = match field("date").and_then(|v| v.as_str()) {
            Some(text) => match NaiveDateTime::parse_from_str(text, INPUT_DATE_FORMAT) {
                Ok(dt) => Some(dt),
                Err(_) => {
                    problems.push(format!("invalid date '{}'", text));
                    None
                }
            },
            None => {
                problems.push("missing date".to_string());
                None
            }
        };

        let value = field("val").and_then(|v| v.as_f64()).unwrap_or_else(|| {
            problems.push("missing val".to_string());
            0.0
        });

        let reference = match field("ref").and_then(|v| v.as_str()) {
            Some(text) => text.to_string(),
            None => {
                problems.push("missing ref".to_string());
                String::new()
            }
        };

        Self {
            date_time,
            value,
            reference,
            running_balance: 0.0,
            error: (!problems.is_empty()).then(|| problems.join(", ")),
        }
    }

    /// Credit for negative values, debit otherwise
    pub fn dc(&self) -> &'static str {
        if self.value < 0.0 {
            "C"
        } else {
            "D"
        }
    }

    /// Date in local time, or an empty string when unknown
    pub fn display_date(&self) -> String {
        self.date_time
            .map(|dt| {
                Utc.from_utc_datetime(&dt)
                    .with_timezone(&Local)
                    .format(DISPLAY_DATE_FORMAT)
                    .to_string()
            })
            .unwrap_or_default()
    }

    pub fn display_value(&self) -> String {
        format!("{:9.2}", self.value)
    }

    pub fn display_balance(&self) -> String {
        format!("{:9.2}", self.running_balance)
    }
}

/// Sorted transactions with running balances
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionView {
    /// Balance before the first transaction
    pub initial_value: f64,
    /// Balance after the last transaction
    pub closing_value: f64,
    /// Rows in date order
    pub records: Vec<TransactionRecord>,
}

impl TransactionView {
    /// Build the view from an account snapshot
    ///
    /// Malformed transactions are kept as error-tagged rows with a zero
    /// value. Rows without a usable date sort after all dated rows.
    pub fn from_account(account: &serde_json::Value, initial_value: f64) -> KeepsakeResult<Self> {
        let fields = account.as_object().ok_or_else(|| KeepsakeError::TypeMismatch {
            name: "account".to_string(),
            expected: "object",
        })?;
        let transactions = fields
            .get(TRANSACTIONS_KEY)
            .ok_or_else(|| KeepsakeError::MissingField(TRANSACTIONS_KEY.to_string()))?
            .as_array()
            .ok_or_else(|| KeepsakeError::TypeMismatch {
                name: TRANSACTIONS_KEY.to_string(),
                expected: "array",
            })?;

        let mut records: Vec<TransactionRecord> =
            transactions.iter().map(TransactionRecord::parse).collect();

        // Stable sort keeps input order for equal dates
        records.sort_by_key(|r| (r.date_time.is_none(), r.date_time));

        let mut balance = initial_value;
        for record in &mut records {
            balance -= record.value;
            record.running_balance = balance;
        }

        Ok(Self {
            initial_value,
            closing_value: balance,
            records,
        })
    }

    /// Build the view for the account at `path` in a document
    pub fn from_document(doc: &Document, path: &str, initial_value: f64) -> KeepsakeResult<Self> {
        let snapshot = doc.snapshot_path(path)?;
        Self::from_account(&snapshot, initial_value)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows carrying an error
    pub fn errors(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.records.iter().filter(|r| r.error.is_some())
    }

    /// Format the ledger for terminal display
    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Opening Balance: {:9.2}\n", self.initial_value));
        output.push_str(&format!("Closing Balance: {:9.2}\n\n", self.closing_value));

        output.push_str(&format!(
            "{:<19}  {:<20} {:>9} {:>2} {:>9}\n",
            "Date", "Ref", "Amount", "", "Balance"
        ));
        output.push_str(&"-".repeat(64));
        output.push('\n');

        for record in &self.records {
            let reference = if record.reference.chars().count() > 20 {
                format!("{}...", record.reference.chars().take(17).collect::<String>())
            } else {
                record.reference.clone()
            };

            output.push_str(&format!(
                "{:<19}  {:<20} {} {:>2} {}\n",
                record.display_date(),
                reference,
                record.display_value(),
                record.dc(),
                record.display_balance()
            ));
            if let Some(error) = &record.error {
                output.push_str(&format!("  ! {}\n", error));
            }
        }

        output
    }
}
