/// The three independent flags that parameterise the placement decision
/// procedure: `neighbours` (forward one hop), `qos` (speculative admission
/// gate), `cost` (cost-based displacement, subsumes `neighbours` in the
/// displacement branch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssignMode {
    pub neighbours: bool,
    pub qos: bool,
    pub cost: bool,
}

impl AssignMode {
    pub const NEAREST: AssignMode = AssignMode {
        neighbours: false,
        qos: false,
        cost: false,
    };

    pub const WITH_NEIGHBOURS: AssignMode = AssignMode {
        neighbours: true,
        qos: false,
        cost: false,
    };

    pub const WITH_NEIGHBOURS_AND_QOS: AssignMode = AssignMode {
        neighbours: true,
        qos: true,
        cost: false,
    };

    pub const COST_PRIORITY: AssignMode = AssignMode {
        neighbours: false,
        qos: false,
        cost: true,
    };

    /// A stable canonical name for logging and CSV-style output, precomputed
    /// rather than derived each call since the flag set never changes once
    /// a `Simulation` is constructed.
    pub fn name(&self) -> &'static str {
        match (self.neighbours, self.qos, self.cost) {
            (false, false, false) => "nearest",
            (true, false, false) => "with_neighbours",
            (true, true, false) => "with_neighbours_and_qos",
            (false, _, true) | (true, _, true) => "cost_priority",
            (false, true, false) => "qos_only",
        }
    }
}

impl std::fmt::Display for AssignMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_are_stable() {
        assert_eq!(AssignMode::NEAREST.name(), "nearest");
        assert_eq!(AssignMode::WITH_NEIGHBOURS.name(), "with_neighbours");
        assert_eq!(
            AssignMode::WITH_NEIGHBOURS_AND_QOS.name(),
            "with_neighbours_and_qos"
        );
        assert_eq!(AssignMode::COST_PRIORITY.name(), "cost_priority");
    }
}
