//! Design settings.
//!
//! [`DesignSettings`] can be filled in directly, through
//! [`crate::DesignBuilder`], or from the key/value rows of a settings sheet
//! with [`DesignSettings::from_pairs`].

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DesignType {
    /// Best-of-N greedy weighted sampling favouring under-shown items.
    #[default]
    Balanced,
    /// Uniform random tasks. Baseline only.
    Random,
    /// Exchange search over all possible tasks, falling back to Balanced.
    Optimal,
}

impl DesignType {
    /// Canonical name as written in settings sheets.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Balanced => "Balanced",
            Self::Random => "Random",
            Self::Optimal => "Optimal",
        }
    }
}

impl fmt::Display for DesignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DesignType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balanced" => Ok(Self::Balanced),
            "random" => Ok(Self::Random),
            "optimal" => Ok(Self::Optimal),
            other => Err(Error::configuration(format!(
                "unknown design type '{other}' (expected Balanced, Random or Optimal)"
            ))),
        }
    }
}

/// Parameters controlling design generation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DesignSettings {
    /// Items shown per task (K).
    pub items_per_task: usize,
    /// Tasks each respondent answers.
    pub tasks_per_respondent: usize,
    /// Number of distinct design versions.
    pub num_versions: usize,
    /// Generation strategy.
    pub design_type: DesignType,
    /// Whether an identical task may appear twice within a version.
    pub allow_repeat_per_respondent: bool,
    /// Soft per-version cap on how often one item is drawn.
    pub max_item_repeats: usize,
    /// Penalise pairs already shown together when drawing a task.
    pub force_min_pair_balance: bool,
    /// Shuffle task order within each version.
    pub randomize_task_order: bool,
    /// Shuffle slot order within each task.
    pub randomize_item_order_within_task: bool,
    /// Balanced search stops once this efficiency is reached.
    pub efficiency_threshold: f64,
    /// Search budget; the Balanced search runs `min(100, max_iterations / 100)`
    /// candidates.
    pub max_iterations: usize,
}

impl Default for DesignSettings {
    fn default() -> Self {
        Self {
            items_per_task: 4,
            tasks_per_respondent: 12,
            num_versions: 1,
            design_type: DesignType::Balanced,
            allow_repeat_per_respondent: false,
            max_item_repeats: 10,
            force_min_pair_balance: false,
            randomize_task_order: true,
            randomize_item_order_within_task: true,
            efficiency_threshold: 0.8,
            max_iterations: 10_000,
        }
    }
}

impl DesignSettings {
    /// Check every setting against its allowed range.
    ///
    /// This does not look at the item set; see
    /// [`DesignSettings::validate_for`] for the item-count check.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] naming the first offending setting.
    pub fn validate(&self) -> Result<()> {
        if self.items_per_task < 2 {
            return Err(Error::configuration(format!(
                "itemsPerTask must be at least 2, got {}",
                self.items_per_task
            )));
        }
        if self.tasks_per_respondent < 1 {
            return Err(Error::configuration("tasksPerRespondent must be at least 1"));
        }
        if self.num_versions < 1 {
            return Err(Error::configuration("numVersions must be at least 1"));
        }
        if self.max_item_repeats < 1 {
            return Err(Error::configuration("maxItemRepeats must be at least 1"));
        }
        if !(0.5..=1.0).contains(&self.efficiency_threshold) {
            return Err(Error::configuration(format!(
                "efficiencyThreshold must be in [0.5, 1.0], got {}",
                self.efficiency_threshold
            )));
        }
        if self.max_iterations < 100 {
            return Err(Error::configuration(format!(
                "maxIterations must be at least 100, got {}",
                self.max_iterations
            )));
        }
        Ok(())
    }

    /// [`DesignSettings::validate`] plus the check that K does not exceed
    /// the number of included items.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] on any violation.
    pub fn validate_for(&self, n_included: usize) -> Result<()> {
        self.validate()?;
        if self.items_per_task > n_included {
            return Err(Error::configuration(format!(
                "itemsPerTask {} exceeds the {} included items",
                self.items_per_task, n_included
            )));
        }
        Ok(())
    }

    /// Number of Balanced candidates drawn before giving up on the threshold.
    #[must_use]
    pub fn balanced_iterations(&self) -> usize {
        (self.max_iterations / 100).clamp(1, 100)
    }

    /// Total number of rows the design will have.
    #[must_use]
    pub fn total_tasks(&self) -> usize {
        self.num_versions * self.tasks_per_respondent
    }

    /// Read settings from `(key, value)` rows of a settings sheet.
    ///
    /// Keys are matched ignoring case and underscores, so `Items_Per_Task`,
    /// `itemsPerTask` and `ITEMSPERTASK` are equivalent. Missing keys keep
    /// their defaults; unknown keys are logged and skipped. The result is
    /// range-checked with [`DesignSettings::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a value cannot be parsed, the
    /// design type is unknown, or a value is out of range.
    ///
    /// # Example
    ///
    /// ```
    /// use maxdiff::{DesignSettings, DesignType};
    ///
    /// let settings = DesignSettings::from_pairs([
    ///     ("Items_Per_Task", "5"),
    ///     ("Design_Type", "optimal"),
    ///     ("Randomize_Task_Order", "FALSE"),
    /// ])
    /// .unwrap();
    ///
    /// assert_eq!(settings.items_per_task, 5);
    /// assert_eq!(settings.design_type, DesignType::Optimal);
    /// assert!(!settings.randomize_task_order);
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut settings = Self::default();

        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.as_ref().trim();
            let normalized: String = key
                .chars()
                .filter(|c| *c != '_' && !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();

            match normalized.as_str() {
                "itemspertask" => settings.items_per_task = parse_count(key, value)?,
                "tasksperrespondent" => settings.tasks_per_respondent = parse_count(key, value)?,
                "numversions" => settings.num_versions = parse_count(key, value)?,
                "designtype" => settings.design_type = value.parse()?,
                "allowrepeatperrespondent" => {
                    settings.allow_repeat_per_respondent = parse_flag(key, value)?;
                }
                "maxitemrepeats" => settings.max_item_repeats = parse_count(key, value)?,
                "forceminpairbalance" => {
                    settings.force_min_pair_balance = parse_flag(key, value)?;
                }
                "randomizetaskorder" => settings.randomize_task_order = parse_flag(key, value)?,
                "randomizeitemorderwithintask" => {
                    settings.randomize_item_order_within_task = parse_flag(key, value)?;
                }
                "efficiencythreshold" => {
                    settings.efficiency_threshold = value.parse().map_err(|_| {
                        Error::configuration(format!("{key}: '{value}' is not a number"))
                    })?;
                }
                "maxiterations" => settings.max_iterations = parse_count(key, value)?,
                _ => tracing::warn!(key, "ignoring unknown design setting"),
            }
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    // Spreadsheet cells often carry integers as "4.0".
    let trimmed = value.strip_suffix(".0").unwrap_or(value);
    trimmed.parse().map_err(|_| {
        Error::configuration(format!("{key}: '{value}' is not a non-negative integer"))
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        _ => Err(Error::configuration(format!(
            "{key}: '{value}' is not TRUE/FALSE"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(DesignSettings::default().validate().is_ok());
        assert_eq!(DesignSettings::default().balanced_iterations(), 100);
    }

    #[test]
    fn test_balanced_iterations_bounds() {
        let mut s = DesignSettings {
            max_iterations: 100,
            ..Default::default()
        };
        assert_eq!(s.balanced_iterations(), 1);
        s.max_iterations = 2_550;
        assert_eq!(s.balanced_iterations(), 25);
        s.max_iterations = 1_000_000;
        assert_eq!(s.balanced_iterations(), 100);
    }

    #[test]
    fn test_range_checks() {
        let bad = [
            DesignSettings {
                items_per_task: 1,
                ..Default::default()
            },
            DesignSettings {
                tasks_per_respondent: 0,
                ..Default::default()
            },
            DesignSettings {
                num_versions: 0,
                ..Default::default()
            },
            DesignSettings {
                max_item_repeats: 0,
                ..Default::default()
            },
            DesignSettings {
                efficiency_threshold: 0.4,
                ..Default::default()
            },
            DesignSettings {
                max_iterations: 99,
                ..Default::default()
            },
        ];
        for s in bad {
            assert!(matches!(s.validate(), Err(Error::Configuration { .. })), "{s:?}");
        }
    }

    #[test]
    fn test_items_per_task_exceeds_included() {
        let s = DesignSettings {
            items_per_task: 5,
            ..Default::default()
        };
        let err = s.validate_for(4).unwrap_err();
        assert!(err.to_string().contains("itemsPerTask 5 exceeds the 4 included items"));
        assert!(s.validate_for(5).is_ok());
    }

    #[test]
    fn test_design_type_parse() {
        assert_eq!("Balanced".parse::<DesignType>().unwrap(), DesignType::Balanced);
        assert_eq!(" RANDOM ".parse::<DesignType>().unwrap(), DesignType::Random);
        assert_eq!("optimal".parse::<DesignType>().unwrap(), DesignType::Optimal);

        let err = "federov".parse::<DesignType>().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("federov"));
    }

    #[test]
    fn test_from_pairs() {
        let s = DesignSettings::from_pairs([
            ("Items_Per_Task", "3"),
            ("Tasks_Per_Respondent", "8.0"),
            ("Num_Versions", "2"),
            ("Design_Type", "Random"),
            ("Allow_Repeat_Per_Respondent", "yes"),
            ("Max_Item_Repeats", "4"),
            ("Force_Min_Pair_Balance", "TRUE"),
            ("Randomize_Task_Order", "0"),
            ("Randomize_Item_Order_Within_Task", "false"),
            ("Efficiency_Threshold", "0.9"),
            ("Max_Iterations", "500"),
            ("Some_Report_Option", "whatever"),
        ])
        .unwrap();

        assert_eq!(s.items_per_task, 3);
        assert_eq!(s.tasks_per_respondent, 8);
        assert_eq!(s.num_versions, 2);
        assert_eq!(s.design_type, DesignType::Random);
        assert!(s.allow_repeat_per_respondent);
        assert_eq!(s.max_item_repeats, 4);
        assert!(s.force_min_pair_balance);
        assert!(!s.randomize_task_order);
        assert!(!s.randomize_item_order_within_task);
        assert!((s.efficiency_threshold - 0.9).abs() < 1e-12);
        assert_eq!(s.max_iterations, 500);
    }

    #[test]
    fn test_from_pairs_errors() {
        assert!(DesignSettings::from_pairs([("Design_Type", "Fancy")]).is_err());
        assert!(DesignSettings::from_pairs([("Items_Per_Task", "four")]).is_err());
        assert!(DesignSettings::from_pairs([("Randomize_Task_Order", "maybe")]).is_err());
        assert!(DesignSettings::from_pairs([("Efficiency_Threshold", "1.5")]).is_err());
    }
}
