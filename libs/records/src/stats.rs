//! Monthly aggregation over operation records

use serde::{Serialize, Serializer};

use crate::{
    models::{AccountType, OperationRecord},
    query::in_month,
};

/// Case totals keyed by category, in order of first occurrence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tally {
    entries: Vec<(String, u64)>,
}

impl Tally {
    pub fn add(&mut self, key: &str, amount: u64) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, total)) => *total += amount,
            None => self.entries.push((key.to_string(), amount)),
        }
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, total)| *total)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy ordered by descending total; equal totals keep first-occurrence order
    pub fn sorted_desc(&self) -> Tally {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        Tally { entries }
    }
}

impl<K: AsRef<str>> FromIterator<(K, u64)> for Tally {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut tally = Tally::default();
        for (key, amount) in iter {
            tally.add(key.as_ref(), amount);
        }
        tally
    }
}

impl Serialize for Tally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

/// Case counts of one operation type split by account type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TypeAccountRow {
    pub operation_type: String,
    pub insurance: u64,
    pub contract: u64,
    pub private: u64,
    pub total: u64,
}

impl TypeAccountRow {
    fn add(&mut self, account_type: AccountType, cases: u64) {
        match account_type {
            AccountType::Insurance => self.insurance += cases,
            AccountType::Contract => self.contract += cases,
            AccountType::Private => self.private += cases,
        }
        self.total += cases;
    }
}

/// Totals for one calendar month
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlyStats {
    pub year: i32,
    pub month: u32,
    pub total_operations: usize,
    pub total_cases: u64,
    pub by_operation_type: Tally,
    pub by_account_type: Tally,
    pub by_surgeon: Tally,
    pub by_type_and_account: Vec<TypeAccountRow>,
}

/// Aggregate the records dated in `year`/`month` (1-indexed)
///
/// Categories that do not occur that month are absent from every tally.
pub fn monthly_stats(records: &[OperationRecord], year: i32, month: u32) -> MonthlyStats {
    let mut stats = MonthlyStats {
        year,
        month,
        ..Default::default()
    };

    for record in in_month(records, year, month) {
        let cases = u64::from(record.case_count);

        stats.total_operations += 1;
        stats.total_cases += cases;
        stats.by_operation_type.add(&record.operation_type, cases);
        stats
            .by_account_type
            .add(record.account_type.as_str(), cases);
        stats.by_surgeon.add(&record.surgeon_name, cases);

        let row = match stats
            .by_type_and_account
            .iter()
            .position(|row| row.operation_type == record.operation_type)
        {
            Some(index) => &mut stats.by_type_and_account[index],
            None => {
                stats.by_type_and_account.push(TypeAccountRow {
                    operation_type: record.operation_type.clone(),
                    ..Default::default()
                });
                let last = stats.by_type_and_account.len() - 1;
                &mut stats.by_type_and_account[last]
            }
        };
        row.add(record.account_type, cases);
    }

    stats
}
