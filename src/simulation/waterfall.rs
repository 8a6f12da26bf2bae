//! Per-person annual cash allocation
//!
//! 1. Cover the person's share of household expenses, drawing on savings when short
//! 2. Emergency fund up to its target (or release the excess)
//! 3. TFSA, tracking the retirement portion
//! 4. RRSP through the before-tax solver
//! 5. Mortgage prepayment
//! 6. Whatever is left goes to the taxable account

use crate::accounts::SavingsAccount;
use crate::error::{Result, SimError};
use crate::tax::{after_tax_cost, before_tax_contribution, TaxSchedule};

use super::history::ContributionRecord;
use super::household::MortgageGoal;
use super::liquidity::{withdraw_from_household, CENT};
use super::person::Person;

/// Net cash flow above this counts as covered
pub const SHORTFALL_TOLERANCE: f64 = -0.01;

pub const MAX_SHORTFALL_ITERATIONS: u32 = 100;

/// Household-wide inputs shared by every person in a year
#[derive(Debug, Clone, Copy)]
pub struct YearContext<'a> {
    pub year: i32,
    pub tax: &'a TaxSchedule,
    /// Total household expenses for the year
    pub annual_expenses: f64,
    pub pay_house_down_asap: bool,
}

impl YearContext<'_> {
    fn expense_share(&self, persons: usize) -> f64 {
        self.annual_expenses / persons.max(1) as f64
    }
}

/// Allocate one person's cash for the year
pub fn contribute(
    persons: &mut [Person],
    index: usize,
    mut mortgage: Option<&mut MortgageGoal>,
    ctx: &YearContext,
) -> Result<ContributionRecord> {
    let share = ctx.expense_share(persons.len());
    let mut record = ContributionRecord::new(ctx.year, index, persons[index].age);
    record.expense_share = share;

    // Non-retirement savings go to the house once it was bought in an earlier year
    if ctx.pay_house_down_asap {
        if let Some(goal) = mortgage.as_deref() {
            if goal.activated_before(ctx.year) && !goal.loan().is_paid_off() {
                record.withdrawn += persons[index].liquidate_for_mortgage();
            }
        }
    }

    let mut net = cover_shortfall(persons, index, ctx, share, &mut record, MAX_SHORTFALL_ITERATIONS)?;
    let after_tax_income = record.after_tax_income();
    let mut retirement_target = (persons[index].settings.max_retirement_contribution * after_tax_income).max(0.0);

    let mortgage_unpaid = mortgage.as_deref().is_some_and(|g| !g.loan().is_paid_off());
    let person = &mut persons[index];

    // Emergency fund
    let monthly_share = share / 12.0;
    let under_target = person.emergency_fund.amount_under_target(monthly_share);
    if under_target > 0.0 {
        let deposited = person.emergency_fund.deposit(under_target.min(net));
        net -= deposited;
        record.emergency_fund = deposited;
    } else {
        let released = person.emergency_fund.withdraw(-under_target).released;
        net += released;
        record.emergency_fund = -released;
    }

    // TFSA
    let restricted = mortgage_unpaid && !person.settings.allow_tfsa_withdrawal;
    let mut retirement_dollars = person.tfsa.balance() * person.tfsa_retirement_portion;
    let (deposited, counted) = if restricted {
        let amount = person.tfsa.contribution_room().min(retirement_target).min(net);
        let deposited = person.tfsa.deposit(amount);
        (deposited, deposited)
    } else {
        let deposited = person.tfsa.deposit(net);
        (deposited, deposited.min(retirement_target))
    };
    net -= deposited;
    retirement_dollars += counted;
    retirement_target -= counted;
    record.tax_free_deposit = deposited;

    // Regular dollars already in the account can be re-designated
    let conversion = retirement_target
        .min(person.tfsa.balance() - retirement_dollars)
        .max(0.0);
    retirement_dollars += conversion;
    retirement_target -= conversion;
    person.set_tfsa_retirement_dollars(retirement_dollars);

    // RRSP
    let room = person.rrsp.contribution_room();
    let desired = if mortgage_unpaid {
        room.min(retirement_target).min(net)
    } else {
        room.min(net)
    };
    let desired = desired.min(after_tax_income).max(0.0);
    if desired > CENT {
        let income = record.before_tax_income;
        let requested = before_tax_contribution(desired, income, ctx.tax)?;
        let accepted = person.rrsp.deposit(requested);
        let cost = after_tax_cost(accepted, income, ctx.tax);
        if accepted + CENT < requested {
            log::debug!(
                "person {} RRSP capped at {:.2} of {:.2}, {:.2} back to cash",
                index,
                accepted,
                requested,
                desired - cost
            );
        }
        net -= cost;
        record.tax_deferred_deposit = accepted;
        record.tax_deferred_cost = cost;
    }

    // Mortgage prepayment
    if ctx.pay_house_down_asap && net > 0.0 {
        if let Some(goal) = mortgage.as_deref_mut() {
            if goal.is_active() && !goal.loan().is_paid_off() {
                let paid = goal.loan_mut().lump_sum_payment(net);
                net -= paid;
                record.mortgage_prepayment = paid;
            }
        }
    }

    record.taxable_deposit = person.taxable.deposit(net);
    Ok(record)
}

/// Withdraw from savings until the person's net cash flow is covered
///
/// `net` strictly increases on every pass: each pass either raises cash or fails.
/// Income realized by later draws on this person (another person's shortfall) is
/// carried into next year's tax base.
fn cover_shortfall(
    persons: &mut [Person],
    index: usize,
    ctx: &YearContext,
    share: f64,
    record: &mut ContributionRecord,
    max_iterations: u32,
) -> Result<f64> {
    for iteration in 0..max_iterations {
        let person = &persons[index];
        record.before_tax_income = person.before_tax_income();
        record.income_tax = ctx.tax.income_tax(record.before_tax_income);
        record.payroll = ctx.tax.payroll_deductions(person.salary);

        let net = record.after_tax_income() + record.withdrawn - share;
        if net >= SHORTFALL_TOLERANCE {
            persons[index].assess_investment_income();
            return Ok(net.max(0.0));
        }

        let shortfall = -net;
        let ceiling = person.withdrawable_cash(ctx.tax, true, true);
        let mut raised = 0.0;
        if ceiling > CENT {
            raised = persons[index].withdraw_cash(ctx.tax, shortfall.min(ceiling));
        }
        if raised <= 0.0 {
            raised = withdraw_from_household(persons, ctx.tax, shortfall);
        }
        if raised <= 0.0 {
            log::warn!(
                "year {}: person {} is short {:.2} with no savings left",
                ctx.year,
                index,
                shortfall
            );
            return Err(SimError::Unaffordable {
                year: ctx.year,
                person: index,
                shortfall,
            });
        }

        log::debug!(
            "year {}: person {} withdrew {:.2} toward a {:.2} shortfall (pass {})",
            ctx.year,
            index,
            raised,
            shortfall,
            iteration + 1
        );
        record.withdrawn += raised;
    }

    Err(SimError::NonConvergence {
        what: "shortfall loop",
        iterations: max_iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{EmergencyFund, RoomAccount, TaxableAccount};
    use crate::expenses::AmortizedLoan;
    use crate::simulation::person::{PersonAccounts, PersonSettings};
    use crate::tax::TaxTable;
    use approx::assert_relative_eq;

    fn flat_tax(rate: f64) -> TaxSchedule {
        TaxSchedule::single(TaxTable::new(vec![0.0], vec![rate]).unwrap())
    }

    fn person(salary: f64, accounts: PersonAccounts, settings: PersonSettings) -> Person {
        Person::new(30, salary, accounts, settings).unwrap()
    }

    fn context(tax: &TaxSchedule, annual_expenses: f64) -> YearContext<'_> {
        YearContext {
            year: 2030,
            tax,
            annual_expenses,
            pay_house_down_asap: true,
        }
    }

    #[test]
    fn test_waterfall_order_without_mortgage() {
        let tax = flat_tax(0.2);
        let accounts = PersonAccounts {
            tfsa: RoomAccount::tax_free(0.0, 5000.0),
            rrsp: RoomAccount::tax_deferred(0.0, 4000.0),
            taxable: TaxableAccount::default(),
            emergency_fund: EmergencyFund::new(0.0, 6.0),
        };
        let mut persons = vec![person(100000.0, accounts, PersonSettings::default())];

        let record = contribute(&mut persons, 0, None, &context(&tax, 24000.0)).unwrap();

        // 80000 after tax, 24000 expenses
        assert_relative_eq!(record.after_tax_income(), 80000.0);
        assert_relative_eq!(record.emergency_fund, 12000.0);
        assert_relative_eq!(record.tax_free_deposit, 5000.0);
        // RRSP fills its room; each dollar costs 0.8 after tax
        assert!((record.tax_deferred_deposit - 4000.0).abs() < 0.2);
        assert_relative_eq!(record.tax_deferred_cost, 0.8 * record.tax_deferred_deposit, epsilon = 1e-6);
        assert_relative_eq!(
            record.taxable_deposit,
            80000.0 - 24000.0 - 12000.0 - 5000.0 - record.tax_deferred_cost,
            epsilon = 1e-6
        );

        let p = &persons[0];
        // The whole deposit counts toward retirement
        assert_relative_eq!(p.tfsa_retirement_portion(), 1.0);
        assert_relative_eq!(p.taxable().balance(), record.taxable_deposit);
    }

    #[test]
    fn test_restricted_tfsa_with_unpaid_mortgage() {
        let tax = flat_tax(0.0);
        let settings = PersonSettings {
            allow_tfsa_withdrawal: false,
            max_retirement_contribution: 0.1,
            ..PersonSettings::default()
        };
        let accounts = PersonAccounts {
            tfsa: RoomAccount::tax_free(0.0, 20000.0),
            rrsp: RoomAccount::tax_deferred(0.0, 20000.0),
            taxable: TaxableAccount::default(),
            emergency_fund: EmergencyFund::new(0.0, 0.0),
        };
        let mut persons = vec![person(50000.0, accounts, settings)];
        let mut goal = MortgageGoal::new(AmortizedLoan::new(300000.0, 60000.0, 0.04, 25).unwrap());
        goal.activate(2030).unwrap();

        let record = contribute(&mut persons, 0, Some(&mut goal), &context(&tax, 20000.0)).unwrap();

        // Only the 5000 retirement target goes into the TFSA, nothing left for the RRSP
        assert_relative_eq!(record.tax_free_deposit, 5000.0);
        assert_eq!(record.tax_deferred_deposit, 0.0);
        // Bought this year, so no forced sale but prepayment applies
        assert_relative_eq!(record.mortgage_prepayment, 25000.0);
        assert_eq!(record.taxable_deposit, 0.0);
        assert_relative_eq!(goal.loan().principal_remaining(), 240000.0 - 25000.0);
    }

    #[test]
    fn test_shortfall_draws_on_own_savings() {
        let tax = flat_tax(0.0);
        let accounts = PersonAccounts {
            taxable: TaxableAccount::new(30000.0, 30000.0),
            emergency_fund: EmergencyFund::new(0.0, 0.0),
            ..PersonAccounts::default()
        };
        let mut persons = vec![person(10000.0, accounts, PersonSettings::default())];

        let record = contribute(&mut persons, 0, None, &context(&tax, 25000.0)).unwrap();

        assert_relative_eq!(record.withdrawn, 15000.0);
        assert_relative_eq!(persons[0].taxable().balance(), 15000.0);
    }

    #[test]
    fn test_shortfall_with_taxed_gains() {
        let tax = flat_tax(0.3);
        let accounts = PersonAccounts {
            taxable: TaxableAccount::new(50000.0, 10000.0),
            emergency_fund: EmergencyFund::new(0.0, 0.0),
            ..PersonAccounts::default()
        };
        let mut persons = vec![person(0.0, accounts, PersonSettings::default())];

        let record = contribute(&mut persons, 0, None, &context(&tax, 20000.0)).unwrap();

        // One draw covers the expenses; half of its 16000 gain is taxed
        assert_relative_eq!(record.withdrawn, 20000.0);
        assert_relative_eq!(record.before_tax_income, 8000.0);
        assert_relative_eq!(record.income_tax, 0.3 * 8000.0);
        let net = record.after_tax_income() + record.withdrawn - record.expense_share;
        assert_relative_eq!(net, 5600.0, epsilon = 1e-9);
        assert_relative_eq!(record.taxable_deposit, 5600.0, epsilon = 1e-9);
        assert_eq!(persons[0].unassessed_investment_income(), 0.0);
    }

    fn two_person_shortfall() -> Vec<Person> {
        let small = PersonAccounts {
            taxable: TaxableAccount::new(4000.0, 4000.0),
            emergency_fund: EmergencyFund::new(0.0, 0.0),
            ..PersonAccounts::default()
        };
        let large = PersonAccounts {
            taxable: TaxableAccount::new(50000.0, 10000.0),
            emergency_fund: EmergencyFund::new(0.0, 0.0),
            ..PersonAccounts::default()
        };
        vec![
            person(0.0, small, PersonSettings::default()),
            person(0.0, large, PersonSettings::default()),
        ]
    }

    #[test]
    fn test_shortfall_takes_several_passes() {
        let tax = flat_tax(0.3);
        let mut persons = two_person_shortfall();

        // Own 4000 first, then 16000 from the other person
        let record = contribute(&mut persons, 0, None, &context(&tax, 40000.0)).unwrap();

        assert_relative_eq!(record.withdrawn, 20000.0, epsilon = 1e-6);
        assert_eq!(record.income_tax, 0.0);
        assert_relative_eq!(persons[0].taxable().balance(), 0.0, epsilon = 1e-6);
        assert_relative_eq!(persons[1].taxable().balance(), 34000.0, epsilon = 1e-6);
        // Not yet taxed: person 1 has not been allocated this year
        assert_relative_eq!(persons[1].yearly_investment_income(), 6400.0, epsilon = 1e-6);

        let second = contribute(&mut persons, 1, None, &context(&tax, 40000.0)).unwrap();
        assert!(second.before_tax_income >= 6400.0);
        assert_eq!(persons[1].unassessed_investment_income(), 0.0);
    }

    #[test]
    fn test_shortfall_pass_cap() {
        let tax = flat_tax(0.3);
        let mut persons = two_person_shortfall();
        let ctx = context(&tax, 40000.0);
        let mut record = ContributionRecord::new(2030, 0, 30);

        let err = cover_shortfall(&mut persons, 0, &ctx, 20000.0, &mut record, 2).unwrap_err();
        assert!(matches!(
            err,
            SimError::NonConvergence { what: "shortfall loop", iterations: 2 }
        ));
    }

    #[test]
    fn test_shortfall_falls_back_to_household() {
        let tax = flat_tax(0.0);
        let broke = PersonAccounts {
            emergency_fund: EmergencyFund::new(0.0, 0.0),
            ..PersonAccounts::default()
        };
        let saver = PersonAccounts {
            taxable: TaxableAccount::new(40000.0, 40000.0),
            emergency_fund: EmergencyFund::new(0.0, 0.0),
            ..PersonAccounts::default()
        };
        let mut persons = vec![
            person(0.0, broke, PersonSettings::default()),
            person(0.0, saver, PersonSettings::default()),
        ];

        let record = contribute(&mut persons, 0, None, &context(&tax, 20000.0)).unwrap();

        assert_relative_eq!(record.withdrawn, 10000.0);
        assert_relative_eq!(persons[1].taxable().balance(), 30000.0);
    }

    #[test]
    fn test_unaffordable_year() {
        let tax = flat_tax(0.0);
        let mut persons = vec![person(1000.0, PersonAccounts::default(), PersonSettings::default())];

        let err = contribute(&mut persons, 0, None, &context(&tax, 5000.0)).unwrap_err();
        match err {
            SimError::Unaffordable { year, person, shortfall } => {
                assert_eq!(year, 2030);
                assert_eq!(person, 0);
                assert_relative_eq!(shortfall, 4000.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_forced_liquidation_pays_mortgage() {
        let tax = flat_tax(0.0);
        let accounts = PersonAccounts {
            taxable: TaxableAccount::new(20000.0, 20000.0),
            emergency_fund: EmergencyFund::new(0.0, 0.0),
            ..PersonAccounts::default()
        };
        let mut persons = vec![person(40000.0, accounts, PersonSettings::default())];
        let mut goal = MortgageGoal::new(AmortizedLoan::new(200000.0, 40000.0, 0.03, 25).unwrap());
        goal.activate(2029).unwrap();

        let record = contribute(&mut persons, 0, Some(&mut goal), &context(&tax, 30000.0)).unwrap();

        assert_relative_eq!(record.withdrawn, 20000.0);
        // TFSA room is 0, so everything after expenses goes to the loan
        assert_relative_eq!(record.mortgage_prepayment, 30000.0);
        assert_eq!(persons[0].taxable().balance(), 0.0);
    }

    #[test]
    fn test_forced_liquidation_takes_regular_tfsa_dollars() {
        let tax = flat_tax(0.0);
        let settings = PersonSettings {
            allow_tfsa_withdrawal: false,
            max_retirement_contribution: 0.0,
            ..PersonSettings::default()
        };
        let accounts = PersonAccounts {
            tfsa: RoomAccount::tax_free(10000.0, 0.0),
            taxable: TaxableAccount::new(5000.0, 5000.0),
            emergency_fund: EmergencyFund::new(0.0, 0.0),
            ..PersonAccounts::default()
        };
        let mut persons = vec![person(40000.0, accounts, settings)];
        persons[0].set_tfsa_retirement_dollars(4000.0);
        let mut goal = MortgageGoal::new(AmortizedLoan::new(200000.0, 40000.0, 0.03, 25).unwrap());
        goal.activate(2029).unwrap();

        let record = contribute(&mut persons, 0, Some(&mut goal), &context(&tax, 30000.0)).unwrap();

        // 5000 taxable plus 6000 regular TFSA dollars
        assert_relative_eq!(record.withdrawn, 11000.0);
        assert_relative_eq!(record.mortgage_prepayment, 21000.0);
        assert_relative_eq!(persons[0].tfsa().balance(), 4000.0);
        assert_relative_eq!(persons[0].tfsa_retirement_portion(), 1.0);
    }
}
