//! Brewing-water salt blending on top of the simplex solver.
//!
//! Given the ion profile of the source water and a target profile, find the amounts of the
//! available salts that minimise the total absolute deviation from the target. Deviations of all
//! ions weigh the same and salts cost nothing.
//!
//! Columns of the generated problem are laid out as one column per salt, followed by one group per
//! tracked ion of (excess, lack, slack-on-excess, slack-on-lack). Each tracked ion contributes two
//! rows, with `d = target - initial` and `added = sum(impact * salt)`:
//!
//! ```text
//! excess row:  added - excess + slack_on_excess = d     (excess >= added - d)
//! lack row:    added + lack   - slack_on_lack   = d     (lack   >= d - added)
//! ```
//!
//! Minimising the sum of all excess and lack columns then yields `sum(|added - d|)`.

use num::ToPrimitive;
use ndarray::{Array1, Array2};
use rustc_hash::FxHashMap;

use std::fmt;

use crate::error::{Result, SimplexError};
use crate::model::Problem;
use crate::simplex::Simplex;
use crate::solver::{SolveAlgorithm, Status};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ion {
    Calcium,
    Magnesium,
    Sodium,
    Chloride,
    Sulfate,
    Bicarbonate,
}

impl Ion {
    pub const ALL: [Ion; 6] = [
        Ion::Calcium,
        Ion::Magnesium,
        Ion::Sodium,
        Ion::Chloride,
        Ion::Sulfate,
        Ion::Bicarbonate,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Ion::Calcium => "Ca",
            Ion::Magnesium => "Mg",
            Ion::Sodium => "Na",
            Ion::Chloride => "Cl",
            Ion::Sulfate => "SO4",
            Ion::Bicarbonate => "HCO3",
        }
    }
}

impl fmt::Display for Ion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Ion concentrations in mg/L.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IonProfile {
    concentrations: FxHashMap<Ion, f64>,
}

impl IonProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: ToPrimitive>(mut self, ion: Ion, mg_per_l: T) -> Self {
        self.set(ion, mg_per_l);
        self
    }

    pub fn set<T: ToPrimitive>(&mut self, ion: Ion, mg_per_l: T) {
        self.concentrations
            .insert(ion, mg_per_l.to_f64().unwrap_or(f64::NAN));
    }

    pub fn get(&self, ion: Ion) -> Option<f64> {
        self.concentrations.get(&ion).copied()
    }

    /// Ions present in the profile, in `Ion` order.
    pub fn ions(&self) -> Vec<Ion> {
        Ion::ALL
            .iter()
            .copied()
            .filter(|ion| self.concentrations.contains_key(ion))
            .collect()
    }

    /// Sum of `|other - self|` over the ions of `self`; ions missing from `other` count as zero.
    pub fn total_deviation(&self, other: &IonProfile) -> f64 {
        self.concentrations
            .iter()
            .map(|(ion, value)| (other.get(*ion).unwrap_or(0.0) - value).abs())
            .sum()
    }
}

/// A salt and the mg/L of each ion that 1 g of it adds to 1 L of water.
#[derive(Clone, Debug, PartialEq)]
pub struct Salt {
    name: String,
    impact: FxHashMap<Ion, f64>,
}

impl Salt {
    pub fn new<T: ToString>(name: T) -> Self {
        Self {
            name: name.to_string(),
            impact: FxHashMap::default(),
        }
    }

    pub fn with_impact<T: ToPrimitive>(mut self, ion: Ion, mg_per_l: T) -> Self {
        self.impact
            .insert(ion, mg_per_l.to_f64().unwrap_or(f64::NAN));
        self
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn impact(&self, ion: Ion) -> f64 {
        self.impact.get(&ion).copied().unwrap_or(0.0)
    }
}

/// The salts available for a blend. Order fixes the salt columns of the generated problem.
#[derive(Clone, Debug, PartialEq)]
pub struct SaltTable {
    salts: Vec<Salt>,
}

impl Default for SaltTable {
    fn default() -> Self {
        Self::new()
            .with_salt(
                Salt::new("Gypsum")
                    .with_impact(Ion::Calcium, 232.8)
                    .with_impact(Ion::Sulfate, 557.9),
            )
            .with_salt(
                Salt::new("Epsom Salt")
                    .with_impact(Ion::Magnesium, 98.6)
                    .with_impact(Ion::Sulfate, 389.7),
            )
            .with_salt(
                Salt::new("Table Salt")
                    .with_impact(Ion::Sodium, 393.4)
                    .with_impact(Ion::Chloride, 606.7),
            )
            .with_salt(
                Salt::new("Calcium Chloride")
                    .with_impact(Ion::Calcium, 272.6)
                    .with_impact(Ion::Chloride, 482.3),
            )
            .with_salt(
                Salt::new("Magnesium Chloride")
                    .with_impact(Ion::Magnesium, 119.5)
                    .with_impact(Ion::Chloride, 348.7),
            )
            .with_salt(
                Salt::new("Chalk")
                    .with_impact(Ion::Calcium, 200.2)
                    .with_impact(Ion::Bicarbonate, 606.8),
            )
            .with_salt(
                Salt::new("Baking Soda")
                    .with_impact(Ion::Sodium, 273.7)
                    .with_impact(Ion::Bicarbonate, 710.0),
            )
    }
}

impl SaltTable {
    pub fn new() -> Self {
        Self { salts: Vec::new() }
    }

    pub fn with_salt(mut self, salt: Salt) -> Self {
        self.salts.push(salt);
        self
    }

    pub fn salts(&self) -> &[Salt] {
        &self.salts
    }

    pub fn len(&self) -> usize {
        self.salts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.salts.is_empty()
    }
}

/// Column and row indices of a generated blending problem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnLayout {
    salts: usize,
    ions: Vec<Ion>,
}

impl ColumnLayout {
    pub fn new(salts: usize, ions: Vec<Ion>) -> Self {
        Self { salts, ions }
    }

    pub fn ions(&self) -> &[Ion] {
        &self.ions
    }

    pub fn salt(&self, k: usize) -> usize {
        assert!(k < self.salts);
        k
    }

    fn group(&self, i: usize) -> usize {
        assert!(i < self.ions.len());
        self.salts + 4 * i
    }

    pub fn excess(&self, i: usize) -> usize {
        self.group(i)
    }

    pub fn lack(&self, i: usize) -> usize {
        self.group(i) + 1
    }

    pub fn slack_on_excess(&self, i: usize) -> usize {
        self.group(i) + 2
    }

    pub fn slack_on_lack(&self, i: usize) -> usize {
        self.group(i) + 3
    }

    pub fn excess_row(&self, i: usize) -> usize {
        2 * i
    }

    pub fn lack_row(&self, i: usize) -> usize {
        2 * i + 1
    }

    pub fn column_count(&self) -> usize {
        self.salts + 4 * self.ions.len()
    }

    pub fn row_count(&self) -> usize {
        2 * self.ions.len()
    }
}

/// Build the blending problem. The tracked ions are those of `initial`; each must have a target.
pub fn blend_problem(
    initial: &IonProfile,
    target: &IonProfile,
    table: &SaltTable,
) -> Result<(Problem, ColumnLayout)> {
    let layout = ColumnLayout::new(table.len(), initial.ions());
    let n = layout.column_count();

    let mut goal = Array1::<f64>::zeros(n);
    let mut constraints = Array2::<f64>::zeros((layout.row_count(), n));
    let mut row_values = Array1::<f64>::zeros(layout.row_count());

    for (i, &ion) in layout.ions().iter().enumerate() {
        let target_value = target.get(ion).ok_or(SimplexError::MissingTarget(ion))?;
        let difference = target_value - initial.get(ion).unwrap_or(0.0);
        let (er, lr) = (layout.excess_row(i), layout.lack_row(i));

        for (k, salt) in table.salts().iter().enumerate() {
            let amount = salt.impact(ion);
            constraints[[er, layout.salt(k)]] = amount;
            constraints[[lr, layout.salt(k)]] = amount;
        }

        constraints[[er, layout.excess(i)]] = -1.0;
        constraints[[er, layout.slack_on_excess(i)]] = 1.0;
        constraints[[lr, layout.lack(i)]] = 1.0;
        constraints[[lr, layout.slack_on_lack(i)]] = -1.0;
        row_values[er] = difference;
        row_values[lr] = difference;

        goal[layout.excess(i)] = 1.0;
        goal[layout.lack(i)] = 1.0;
    }

    let problem = Problem::from_arrays(goal, constraints, row_values)?;
    Ok((problem, layout))
}

/// Recommended grams per litre of each salt, in table order.
#[derive(Clone, Debug, PartialEq)]
pub struct SaltAdditions {
    amounts: Vec<(String, f64)>,
    total_deviation: f64,
}

impl SaltAdditions {
    /// Grams per litre of the named salt; zero for salts not in the table.
    pub fn amount(&self, name: &str) -> f64 {
        self.amounts
            .iter()
            .find(|(salt, _)| salt == name)
            .map(|(_, amount)| *amount)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.amounts
            .iter()
            .map(|(salt, amount)| (salt.as_str(), *amount))
    }

    /// Minimal sum of absolute deviations from the target over the tracked ions.
    pub fn total_deviation(&self) -> f64 {
        self.total_deviation
    }

    /// Profile of `initial` after the additions, for the ions tracked in `initial`.
    pub fn resulting_profile(&self, initial: &IonProfile, table: &SaltTable) -> IonProfile {
        let mut profile = IonProfile::new();
        for ion in initial.ions() {
            let added: f64 = table
                .salts()
                .iter()
                .zip(self.amounts.iter())
                .map(|(salt, (_, amount))| salt.impact(ion) * amount)
                .sum();
            profile.set(ion, initial.get(ion).unwrap_or(0.0) + added);
        }
        profile
    }
}

pub fn optimise_salts_with<A: SolveAlgorithm>(
    algorithm: &A,
    initial: &IonProfile,
    target: &IonProfile,
    table: &SaltTable,
) -> Result<SaltAdditions> {
    let (problem, layout) = blend_problem(initial, target, table)?;
    let solution = algorithm.solve(&problem)?;

    let total_deviation = match (solution.status(), solution.goal_value()) {
        (Status::Optimal, Some(value)) => value,
        (status, _) => return Err(SimplexError::NoSolution(status)),
    };

    let amounts = table
        .salts()
        .iter()
        .enumerate()
        .map(|(k, salt)| (salt.name().to_string(), solution.value(layout.salt(k))))
        .collect();

    Ok(SaltAdditions {
        amounts,
        total_deviation,
    })
}

/// Optimise with the default simplex configuration.
pub fn optimise_salts(
    initial: &IonProfile,
    target: &IonProfile,
    table: &SaltTable,
) -> Result<SaltAdditions> {
    optimise_salts_with(&Simplex::new(), initial, target, table)
}
