/// The four QoS coefficients of spec §4.9.
#[derive(Debug, Clone, Copy)]
pub struct QosConstants {
    pub k_tasks: f64,
    pub k_nodes: f64,
    pub k_links: f64,
    pub k_cost: f64,
}

impl Default for QosConstants {
    fn default() -> Self {
        Self {
            k_tasks: 3.0,
            k_nodes: 1.0,
            k_links: 1.0,
            k_cost: 0.5,
        }
    }
}

/// The metrics exposed alongside the scalar QoS each tick
/// (`get_eval_parameters` in the spec).
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalParameters {
    pub allocated_tasks: usize,
    pub pending_tasks: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    pub total_tasks: usize,
    pub nodes_usage_var: f64,
    pub links_load_var: f64,
    pub all_task_distances: f64,
}

/// Population variance (divide by `n`, not `n - 1`) of a set of samples.
/// Empty input (e.g. no fogs) is defined as zero so that `QoS == 0` on an
/// empty fog set, per the boundary behaviour in spec §8.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Compute the scalar QoS from its four constituent terms.
pub fn evaluate(
    in_progress_tasks: usize,
    nodes_usage: &[f64],
    links_load: &[f64],
    all_task_distances: f64,
    constants: &QosConstants,
) -> f64 {
    constants.k_tasks * in_progress_tasks as f64
        - constants.k_nodes * population_variance(nodes_usage)
        - constants.k_links * population_variance(links_load)
        - constants.k_cost * all_task_distances
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fog_set_yields_zero_qos() {
        let constants = QosConstants::default();
        assert_eq!(evaluate(0, &[], &[], 0.0, &constants), 0.0);
    }

    #[test]
    fn qos_increases_with_in_progress_count_alone() {
        let constants = QosConstants::default();
        let usages = [0.2, 0.3];
        let links = [0.1, 0.1];
        let q0 = evaluate(1, &usages, &links, 0.0, &constants);
        let q1 = evaluate(2, &usages, &links, 0.0, &constants);
        assert!(q1 > q0);
    }

    #[test]
    fn qos_decreases_with_usage_variance() {
        let constants = QosConstants::default();
        let balanced = [0.5, 0.5];
        let skewed = [0.0, 1.0];
        let q_balanced = evaluate(0, &balanced, &[], 0.0, &constants);
        let q_skewed = evaluate(0, &skewed, &[], 0.0, &constants);
        assert!(q_balanced > q_skewed);
    }

    #[test]
    fn qos_decreases_with_task_distance_cost() {
        let constants = QosConstants::default();
        let q0 = evaluate(0, &[], &[], 0.0, &constants);
        let q1 = evaluate(0, &[], &[], 10.0, &constants);
        assert!(q1 < q0);
    }
}
