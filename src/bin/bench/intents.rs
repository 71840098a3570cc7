// Player Intent Generator - seedable random GameEvents
// Drives the engine the way a human at the console would, including the
// occasional malformed or unaffordable order.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rift_engine::*;

/// Relative weights of each intent kind.
#[derive(Debug, Clone, Copy)]
pub struct IntentMix {
    pub dispatch: f64,
    pub buy: f64,
    pub sell: f64,
    pub reverse: f64,
    pub observer: f64,
    pub reroute: f64,
    pub build: f64,
    pub research: f64,
    pub governance: f64,
}

impl IntentMix {
    pub const BALANCED: IntentMix = IntentMix {
        dispatch: 0.35,
        buy: 0.15,
        sell: 0.10,
        reverse: 0.10,
        observer: 0.08,
        reroute: 0.07,
        build: 0.05,
        research: 0.05,
        governance: 0.05,
    };

    pub const TRADER: IntentMix = IntentMix {
        dispatch: 0.10,
        buy: 0.45,
        sell: 0.45,
        reverse: 0.0,
        observer: 0.0,
        reroute: 0.0,
        build: 0.0,
        research: 0.0,
        governance: 0.0,
    };

    fn weights(&self) -> [f64; 9] {
        [
            self.dispatch,
            self.buy,
            self.sell,
            self.reverse,
            self.observer,
            self.reroute,
            self.build,
            self.research,
            self.governance,
        ]
    }
}

pub struct IntentGenerator {
    rng: ChaCha8Rng,
    mix: IntentMix,
    pub generated: u32,
}

impl IntentGenerator {
    pub fn new(rng: ChaCha8Rng, mix: IntentMix) -> Self {
        Self { rng, mix, generated: 0 }
    }

    /// Poisson-distributed batch of intents for one tick.
    pub fn generate_tick(&mut self, world: &WorldState, lambda: f64) -> Vec<GameEvent> {
        if lambda <= 0.0 {
            return Vec::new();
        }
        let n = poisson_sample(&mut self.rng, lambda);
        let mut out = Vec::with_capacity(n as usize);
        for _ in 0..n {
            if let Some(event) = self.intent(world) {
                out.push(event);
                self.generated += 1;
            }
        }
        out
    }

    fn intent(&mut self, world: &WorldState) -> Option<GameEvent> {
        let nodes: Vec<&NodeId> = world.nodes.keys().collect();
        let fleets: Vec<&Fleet> = world.fleets_owned_by(&Actor::Player).collect();
        let node = (*nodes.get(self.rng.gen_range(0..nodes.len().max(1)))?).clone();
        let commodity = Commodity::ALL[self.rng.gen_range(0..Commodity::ALL.len())];

        match self.pick_kind() {
            0 => {
                let fleet = fleets.get(self.rng.gen_range(0..fleets.len().max(1)))?;
                let lanes: Vec<NodeId> = world.neighbours(&fleet.node_from).map(|(n, _)| n.clone()).collect();
                let to = lanes.get(self.rng.gen_range(0..lanes.len().max(1)))?.clone();
                // Up to 20% over capacity so some dispatches are refused.
                let max = fleet.vessel.capacity() + fleet.vessel.capacity() / 5;
                Some(GameEvent::DispatchFleet {
                    fleet_id: Some(fleet.id.clone()),
                    vessel: None,
                    from: fleet.node_from.clone(),
                    to,
                    commodity,
                    quantity: self.rng.gen_range(1..=max),
                })
            }
            1 => Some(GameEvent::PlaceBuyOrder { node_id: node, commodity, quantity: self.rng.gen_range(1..=15) }),
            2 => {
                // Sell from an existing stockpile when there is one.
                let held: Vec<(&NodeId, Commodity)> = world
                    .player
                    .holdings
                    .iter()
                    .flat_map(|(at, stock)| stock.keys().map(move |c| (at, *c)))
                    .collect();
                let (node_id, commodity) = match held.get(self.rng.gen_range(0..held.len().max(1))) {
                    Some((at, c)) => ((*at).clone(), *c),
                    None => (node, commodity),
                };
                Some(GameEvent::PlaceSellOrder { node_id, commodity, quantity: self.rng.gen_range(1..=15) })
            }
            3 => {
                let fleet = fleets.get(self.rng.gen_range(0..fleets.len().max(1)))?;
                let domain = ConsequenceDomain::ALL[self.rng.gen_range(0..3)];
                Some(GameEvent::reversal(&Actor::Player, fleet.id.clone(), domain))
            }
            4 => {
                let observers: Vec<&ObserverId> = world
                    .observers
                    .values()
                    .filter(|o| o.owner == Actor::Player)
                    .map(|o| &o.id)
                    .collect();
                let observer = (*observers.get(self.rng.gen_range(0..observers.len().max(1)))?).clone();
                let assignment = if self.rng.gen_bool(0.5) {
                    ObserverAssignment::Node(node)
                } else {
                    let fleet = fleets.get(self.rng.gen_range(0..fleets.len().max(1)))?;
                    ObserverAssignment::Fleet(fleet.id.clone())
                };
                Some(GameEvent::AssignObserver { observer_id: observer, assignment })
            }
            5 => {
                let fleet = fleets.get(self.rng.gen_range(0..fleets.len().max(1)))?;
                Some(GameEvent::RerouteFleet { fleet_id: fleet.id.clone(), to: node })
            }
            6 => {
                let structures = [StructureKind::CargoStabilizer, StructureKind::HullRecalibrator, StructureKind::ObserverAnchor];
                Some(GameEvent::BuildStructure { node_id: node, structure: structures[self.rng.gen_range(0..3)] })
            }
            7 => {
                let techs = [TechId::EntropyShielding, TechId::ReversalCatalysts, TechId::LogisticsDrives];
                Some(GameEvent::ResearchTech { tech: techs[self.rng.gen_range(0..3)] })
            }
            _ => Some(GameEvent::InvestGovernance { node_id: node }),
        }
    }

    fn pick_kind(&mut self) -> usize {
        let weights = self.mix.weights();
        let total: f64 = weights.iter().sum();
        let mut r = self.rng.gen::<f64>() * total;
        for (i, w) in weights.iter().enumerate() {
            if r < *w {
                return i;
            }
            r -= w;
        }
        weights.len() - 1
    }
}

/// Poisson sampling via Knuth's algorithm. Intent rates stay small.
fn poisson_sample(rng: &mut ChaCha8Rng, lambda: f64) -> u32 {
    let l = (-lambda).exp();
    let mut k: u32 = 0;
    let mut p: f64 = 1.0;
    loop {
        k += 1;
        p *= rng.gen::<f64>();
        if p <= l {
            return k - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_poisson_mean() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let lambda = 2.0;
        let n = 10000;
        let sum: u64 = (0..n).map(|_| poisson_sample(&mut rng, lambda) as u64).sum();
        let mean = sum as f64 / n as f64;
        assert!((mean - lambda).abs() < 0.1, "Poisson mean {} far from λ={}", mean, lambda);
    }

    #[test]
    fn test_same_seed_same_intents() {
        let world = bootstrap::default_world(&SimConfig::default());
        let mut a = IntentGenerator::new(ChaCha8Rng::seed_from_u64(7), IntentMix::BALANCED);
        let mut b = IntentGenerator::new(ChaCha8Rng::seed_from_u64(7), IntentMix::BALANCED);
        for _ in 0..20 {
            assert_eq!(a.generate_tick(&world, 1.5), b.generate_tick(&world, 1.5));
        }
    }

    #[test]
    fn test_trader_mix_only_trades() {
        let world = bootstrap::default_world(&SimConfig::default());
        let mut gen = IntentGenerator::new(ChaCha8Rng::seed_from_u64(3), IntentMix::TRADER);
        for event in gen.generate_tick(&world, 25.0) {
            assert!(matches!(
                event,
                GameEvent::DispatchFleet { .. } | GameEvent::PlaceBuyOrder { .. } | GameEvent::PlaceSellOrder { .. }
            ));
        }
    }
}
