//! Aggregates transactions into report figures.
//!
//! Every function here is pure and works on transactions that have already
//! been fetched for a user and date range. Amounts are summed as is,
//! regardless of their currency or status.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::transaction::{Category, Transaction, TransactionType};

/// Total income and expenses over a range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeVsExpenses {
    pub income: f64,
    pub expenses: f64,
}

/// The total spent in one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub amount: f64,
}

/// Income and expenses for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    /// The month formatted as "YYYY-MM".
    pub month: String,
    pub income: f64,
    pub expenses: f64,
}

/// Spending in one category as a share of all spending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: Category,
    pub amount: f64,
    /// `amount` as a percentage of total expenses.
    pub percentage: f64,
}

/// The headline figures for a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_savings: f64,
    pub savings_rate: f64,
    pub category_breakdown: Vec<CategoryBreakdown>,
}

/// Sums income and expenses.
pub fn income_vs_expenses(transactions: &[Transaction]) -> IncomeVsExpenses {
    transactions
        .iter()
        .fold(IncomeVsExpenses::default(), |mut totals, transaction| {
            match transaction.transaction_type {
                TransactionType::Income => totals.income += transaction.amount,
                TransactionType::Expense => totals.expenses += transaction.amount,
            }
            totals
        })
}

/// Sums expenses by category.
///
/// # Returns
/// One entry per category with expenses, largest amount first. Categories with
/// equal amounts are ordered by name.
pub fn category_spending(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<Category, f64> = HashMap::new();

    for transaction in transactions {
        if transaction.transaction_type == TransactionType::Expense {
            *totals.entry(transaction.category).or_insert(0.0) += transaction.amount;
        }
    }

    let mut totals: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, amount)| CategoryTotal { category, amount })
        .collect();

    totals.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });

    totals
}

/// Sums income and expenses by calendar month.
///
/// # Returns
/// One entry per month that has transactions, in chronological order.
pub fn monthly_trend(transactions: &[Transaction]) -> Vec<MonthlyTotals> {
    let mut months: BTreeMap<(i32, u8), IncomeVsExpenses> = BTreeMap::new();

    for transaction in transactions {
        let key = (transaction.date.year(), transaction.date.month() as u8);
        let totals = months.entry(key).or_default();

        match transaction.transaction_type {
            TransactionType::Income => totals.income += transaction.amount,
            TransactionType::Expense => totals.expenses += transaction.amount,
        }
    }

    months
        .into_iter()
        .map(|((year, month), totals)| MonthlyTotals {
            month: format!("{year:04}-{month:02}"),
            income: totals.income,
            expenses: totals.expenses,
        })
        .collect()
}

/// The share of income that was not spent, as a percentage.
///
/// Zero when there is no income. Negative when expenses exceed income.
pub fn savings_rate(totals: IncomeVsExpenses) -> f64 {
    if totals.income > 0.0 {
        (totals.income - totals.expenses) / totals.income * 100.0
    } else {
        0.0
    }
}

/// Computes the summary stored in report snapshots.
pub fn summarize(transactions: &[Transaction]) -> ReportSummary {
    let totals = income_vs_expenses(transactions);

    let category_breakdown = category_spending(transactions)
        .into_iter()
        .map(|CategoryTotal { category, amount }| CategoryBreakdown {
            category,
            amount,
            percentage: if totals.expenses > 0.0 {
                amount / totals.expenses * 100.0
            } else {
                0.0
            },
        })
        .collect();

    ReportSummary {
        total_income: totals.income,
        total_expenses: totals.expenses,
        net_savings: totals.income - totals.expenses,
        savings_rate: savings_rate(totals),
        category_breakdown,
    }
}

#[cfg(test)]
mod tests {
    use time::{Date, OffsetDateTime, macros::date};

    use crate::{
        UserID,
        transaction::{Category, PaymentMethod, Transaction, TransactionStatus, TransactionType},
    };

    use super::{
        CategoryTotal, IncomeVsExpenses, MonthlyTotals, category_spending, income_vs_expenses,
        monthly_trend, savings_rate, summarize,
    };

    fn transaction(
        transaction_type: TransactionType,
        category: Category,
        amount: f64,
        date: Date,
    ) -> Transaction {
        Transaction {
            id: 0,
            user_id: UserID::new(1),
            amount,
            transaction_type,
            category,
            description: String::new(),
            date,
            currency: "USD".to_owned(),
            payment_method: PaymentMethod::Other,
            status: TransactionStatus::Completed,
            external_id: None,
            tags: Vec::new(),
            location: None,
            receipt: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn expense(category: Category, amount: f64) -> Transaction {
        transaction(TransactionType::Expense, category, amount, date!(2025 - 01 - 10))
    }

    fn income(amount: f64) -> Transaction {
        transaction(TransactionType::Income, Category::Salary, amount, date!(2025 - 01 - 10))
    }

    #[test]
    fn no_transactions_gives_zero_totals() {
        assert_eq!(
            income_vs_expenses(&[]),
            IncomeVsExpenses {
                income: 0.0,
                expenses: 0.0
            }
        );
    }

    #[test]
    fn savings_rate_is_zero_without_income() {
        assert_eq!(
            savings_rate(IncomeVsExpenses {
                income: 0.0,
                expenses: 50.0
            }),
            0.0
        );
    }

    #[test]
    fn savings_rate_is_share_of_income_kept() {
        assert_eq!(
            savings_rate(IncomeVsExpenses {
                income: 200.0,
                expenses: 150.0
            }),
            25.0
        );
    }

    #[test]
    fn category_spending_ignores_income() {
        let transactions = [
            expense(Category::Food, 10.0),
            expense(Category::Food, 5.0),
            income(100.0),
        ];

        assert_eq!(
            category_spending(&transactions),
            vec![CategoryTotal {
                category: Category::Food,
                amount: 15.0
            }]
        );
    }

    #[test]
    fn category_spending_is_largest_first_then_by_name() {
        let transactions = [
            expense(Category::Utilities, 10.0),
            expense(Category::Housing, 50.0),
            expense(Category::Entertainment, 10.0),
        ];

        let categories: Vec<Category> = category_spending(&transactions)
            .into_iter()
            .map(|total| total.category)
            .collect();

        assert_eq!(
            categories,
            vec![Category::Housing, Category::Entertainment, Category::Utilities]
        );
    }

    #[test]
    fn category_totals_sum_to_total_expenses() {
        let transactions = [
            expense(Category::Food, 12.5),
            expense(Category::Housing, 300.0),
            expense(Category::Food, 7.5),
            income(1000.0),
        ];

        let sum: f64 = category_spending(&transactions)
            .iter()
            .map(|total| total.amount)
            .sum();

        assert_eq!(sum, income_vs_expenses(&transactions).expenses);
    }

    #[test]
    fn monthly_trend_is_chronological() {
        let transactions = [
            transaction(TransactionType::Expense, Category::Food, 5.0, date!(2025 - 02 - 03)),
            transaction(TransactionType::Income, Category::Salary, 100.0, date!(2024 - 12 - 31)),
            transaction(TransactionType::Expense, Category::Food, 20.0, date!(2025 - 01 - 15)),
            transaction(TransactionType::Income, Category::Salary, 100.0, date!(2025 - 02 - 28)),
        ];

        assert_eq!(
            monthly_trend(&transactions),
            vec![
                MonthlyTotals {
                    month: "2024-12".to_owned(),
                    income: 100.0,
                    expenses: 0.0
                },
                MonthlyTotals {
                    month: "2025-01".to_owned(),
                    income: 0.0,
                    expenses: 20.0
                },
                MonthlyTotals {
                    month: "2025-02".to_owned(),
                    income: 100.0,
                    expenses: 5.0
                },
            ]
        );
    }

    #[test]
    fn summary_breaks_down_expenses() {
        let transactions = [
            expense(Category::Food, 25.0),
            expense(Category::Housing, 75.0),
            income(400.0),
        ];

        let summary = summarize(&transactions);

        assert_eq!(summary.total_income, 400.0);
        assert_eq!(summary.total_expenses, 100.0);
        assert_eq!(summary.net_savings, 300.0);
        assert_eq!(summary.savings_rate, 75.0);
        assert_eq!(summary.category_breakdown[0].category, Category::Housing);
        assert_eq!(summary.category_breakdown[0].percentage, 75.0);
        assert_eq!(summary.category_breakdown[1].percentage, 25.0);
    }

    #[test]
    fn summary_of_income_only_has_empty_breakdown() {
        let summary = summarize(&[income(10.0)]);

        assert!(summary.category_breakdown.is_empty());
        assert_eq!(summary.savings_rate, 100.0);
    }
}
