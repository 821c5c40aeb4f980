//! Aggregate metrics for the dashboard and financial summary.

use crate::model::{Animal, AnimalStatus, AnimalType, Gender, Transaction, TransactionType};

/// Dashboard headline numbers, computed over already-filtered snapshots.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardMetrics {
    pub total_animals: usize,
    pub total_sheep: usize,
    pub total_goats: usize,
    pub total_ewes: usize,
    pub total_rams: usize,
    /// Young stock: lambs and kids together, one dashboard tile.
    pub total_young: usize,
    /// Sum of purchase cost over active animals.
    pub total_value: f64,
    pub net_profit: f64,
}

/// Transaction totals by kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FinancialSummary {
    pub total_sales: f64,
    pub total_purchases: f64,
    pub total_expenses: f64,
    /// `sales - purchases - expenses`.
    pub net_profit: f64,
}

pub fn compute_dashboard_metrics(
    animals: &[Animal],
    transactions: &[Transaction],
) -> DashboardMetrics {
    let count = |predicate: &dyn Fn(&&Animal) -> bool| animals.iter().filter(predicate).count();

    let total_value = animals
        .iter()
        .filter(|animal| animal.status == AnimalStatus::Active)
        .map(|animal| animal.purchase_cost)
        .sum();

    DashboardMetrics {
        total_animals: animals.len(),
        total_sheep: count(&|a| a.animal_type == AnimalType::Sheep),
        total_goats: count(&|a| a.animal_type == AnimalType::Goat),
        total_ewes: count(&|a| a.gender == Gender::Ewe),
        total_rams: count(&|a| a.gender == Gender::Ram),
        total_young: count(&|a| matches!(a.gender, Gender::Lamb | Gender::Kid)),
        total_value,
        net_profit: compute_financial_summary(transactions).net_profit,
    }
}

pub fn compute_financial_summary(transactions: &[Transaction]) -> FinancialSummary {
    let total_of = |kind: TransactionType| {
        transactions
            .iter()
            .filter(|transaction| transaction.kind == kind)
            .map(|transaction| transaction.amount)
            .sum::<f64>()
    };

    let total_sales = total_of(TransactionType::Sale);
    let total_purchases = total_of(TransactionType::Purchase);
    let total_expenses = total_of(TransactionType::Expense);

    FinancialSummary {
        total_sales,
        total_purchases,
        total_expenses,
        net_profit: total_sales - total_purchases - total_expenses,
    }
}
