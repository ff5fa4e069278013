//! Scenario ingestion and validation.

use std::error::Error;
use std::fmt;
use std::fs;

use serde::{Deserialize, Serialize};

/// Timing profile of a single student, in logical time units.
///
/// The fields are unsigned, so negative values in a scenario file are
/// rejected at parse time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSpec {
    /// Offset from the simulation start at which the student arrives.
    pub arrival_time: u64,
    /// How long the student occupies a machine once admitted.
    pub wash_time: u64,
    /// How long the student is willing to wait for a free machine.
    pub patience: u64,
}

/// Full description of a simulation run.
///
/// Student ids are assigned 1..N in the order the students are listed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Number of washing machines in the pool.
    pub machine_count: u32,
    /// Students, in ingestion order.
    pub students: Vec<StudentSpec>,
}

impl Scenario {
    /// Loads and validates a scenario from a YAML file.
    pub fn from_yaml_file(path: &str) -> Result<Self, ScenarioError> {
        let content = fs::read_to_string(path).map_err(|e| ScenarioError::Io(path.to_owned(), e))?;
        let scenario: Scenario = serde_yaml::from_str(&content).map_err(ScenarioError::Parse)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Checks the scenario before any simulation state is built.
    ///
    /// A pool without machines is rejected: such a simulation has a trivial
    /// outcome (everyone walks out) and almost certainly indicates a mistake
    /// in the scenario.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.machine_count == 0 {
            return Err(ScenarioError::NoMachines);
        }
        Ok(())
    }

    /// Number of students in the scenario.
    pub fn student_count(&self) -> u32 {
        self.students.len() as u32
    }
}

/// Errors detected before a simulation starts.
#[derive(Debug)]
pub enum ScenarioError {
    /// The scenario file could not be read.
    Io(String, std::io::Error),
    /// The scenario file could not be parsed.
    Parse(serde_yaml::Error),
    /// The scenario has no washing machines.
    NoMachines,
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScenarioError::Io(path, e) => write!(f, "failed to read scenario file {}: {}", path, e),
            ScenarioError::Parse(e) => write!(f, "failed to parse scenario: {}", e),
            ScenarioError::NoMachines => write!(f, "scenario must have at least one washing machine"),
        }
    }
}

impl Error for ScenarioError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ScenarioError::Io(_, e) => Some(e),
            ScenarioError::Parse(e) => Some(e),
            ScenarioError::NoMachines => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Scenario, ScenarioError, StudentSpec};

    #[test]
    fn test_parse_yaml() {
        let yaml = "
machine_count: 2
students:
  - { arrival_time: 0, wash_time: 5, patience: 10 }
  - { arrival_time: 1, wash_time: 1, patience: 0 }
";
        let scenario: Scenario = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(scenario.machine_count, 2);
        assert_eq!(
            scenario.students,
            vec![
                StudentSpec {
                    arrival_time: 0,
                    wash_time: 5,
                    patience: 10
                },
                StudentSpec {
                    arrival_time: 1,
                    wash_time: 1,
                    patience: 0
                },
            ]
        );
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_negative_values_are_rejected_at_parse_time() {
        let yaml = "
machine_count: 1
students:
  - { arrival_time: -1, wash_time: 5, patience: 10 }
";
        assert!(serde_yaml::from_str::<Scenario>(yaml).is_err());
    }

    #[test]
    fn test_zero_machines_are_rejected() {
        let scenario = Scenario {
            machine_count: 0,
            students: vec![StudentSpec {
                arrival_time: 0,
                wash_time: 1,
                patience: 1,
            }],
        };
        assert!(matches!(scenario.validate(), Err(ScenarioError::NoMachines)));
    }
}
