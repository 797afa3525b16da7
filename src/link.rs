use crate::fog::FogId;

/// A directed edge from a fog node to one of its nearest neighbours.
#[derive(Debug, Clone)]
pub struct FogLink {
    pub target: FogId,
    pub latency: i64,
    pub bandwidth: i64,
    pub charge: i64,
}

impl FogLink {
    pub fn new(target: FogId, latency: i64, bandwidth: i64) -> Self {
        Self {
            target,
            latency,
            bandwidth,
            charge: 0,
        }
    }

    pub fn can_handle(&self, incoming: i64) -> bool {
        self.charge + incoming <= self.bandwidth
    }

    pub fn usage(&self) -> f64 {
        if self.bandwidth == 0 {
            0.0
        } else {
            self.charge as f64 / self.bandwidth as f64
        }
    }

    pub fn reset_charge(&mut self) {
        self.charge = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn can_handle_respects_bandwidth_budget() {
        let mut fogs: SlotMap<FogId, ()> = SlotMap::with_key();
        let target = fogs.insert(());
        let mut link = FogLink::new(target, 5, 100);
        assert!(link.can_handle(100));
        link.charge += 60;
        assert!(link.can_handle(40));
        assert!(!link.can_handle(41));
    }

    #[test]
    fn charge_resets_to_zero() {
        let mut fogs: SlotMap<FogId, ()> = SlotMap::with_key();
        let target = fogs.insert(());
        let mut link = FogLink::new(target, 0, 10);
        link.charge = 7;
        link.reset_charge();
        assert_eq!(link.charge, 0);
        assert_eq!(link.usage(), 0.0);
    }
}
