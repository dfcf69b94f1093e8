//! End-to-end scenarios for the recursive engine and the bundled variant,
//! verified against an in-memory union-find oracle both as pair sets and
//! as induced equivalence relations.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

use emcc::bundles::SibeynWithBundles;
use emcc::contraction::ContractionKind;
use emcc::graph::Edge;
use emcc::policy::Policy;
use emcc::{EdgeStream, SubproblemManager};
use emcc_logging::StageLogger;
use emcc_storage::{Limits, Streamer};

/// Deterministic reference components.
struct Oracle {
    parent: BTreeMap<u64, u64>,
}

impl Oracle {
    fn new(edges: &[(u64, u64)]) -> Self {
        let mut oracle = Oracle {
            parent: BTreeMap::new(),
        };
        for &(u, v) in edges {
            let ru = oracle.find(u);
            let rv = oracle.find(v);
            if ru != rv {
                oracle.parent.insert(ru, rv);
            }
        }
        oracle
    }

    fn find(&mut self, u: u64) -> u64 {
        let p = *self.parent.entry(u).or_insert(u);
        if p == u {
            u
        } else {
            let root = self.find(p);
            self.parent.insert(u, root);
            root
        }
    }

    fn nodes(&self) -> Vec<u64> {
        self.parent.keys().copied().collect()
    }
}

fn edge_stream(edges: &[(u64, u64)], limits: &Limits) -> EdgeStream {
    let mut stream = EdgeStream::with_policy(limits, false, false);
    for &(u, v) in edges {
        stream.push(Edge::new(u, v)).unwrap();
    }
    stream.consume().unwrap();
    stream
}

fn run_manager(
    edges: &[(u64, u64)],
    num_nodes: u64,
    memory: u64,
    variant: u8,
    contraction: ContractionKind,
    seed: u64,
) -> BTreeMap<u64, u64> {
    let limits = Limits::default();
    let mut stream = edge_stream(edges, &limits);
    let mut manager = SubproblemManager::new(
        memory,
        Policy::variant(variant),
        contraction,
        seed,
        &limits,
        StageLogger::disabled(),
    );
    let mut output = manager.run(&mut stream, num_nodes).unwrap();
    let mut map = BTreeMap::new();
    while !output.empty() {
        let entry = output.peek();
        assert!(
            map.insert(entry.node, entry.comp).is_none(),
            "node {} labelled twice",
            entry.node
        );
        output.advance().unwrap();
    }
    map
}

/// The output must have star shape and induce exactly the oracle partition.
fn check_against_oracle(edges: &[(u64, u64)], map: &BTreeMap<u64, u64>, context: &str) {
    let mut oracle = Oracle::new(edges);
    let nodes = oracle.nodes();
    assert_eq!(
        map.len(),
        nodes.len(),
        "{}: expected one pair per node",
        context
    );

    // Star shape: representatives are fixed points of the mapping.
    for (&node, &comp) in map {
        assert_eq!(map.get(&comp), Some(&comp), "{}: node {}", context, node);
    }

    // Partition: same representative iff same oracle component.
    for &u in &nodes {
        for &v in &nodes {
            assert_eq!(
                map[&u] == map[&v],
                oracle.find(u) == oracle.find(v),
                "{}: nodes {} and {}",
                context,
                u,
                v
            );
        }
    }
}

const PATH_OF_FIVE: &[(u64, u64)] = &[(1, 2), (2, 3), (3, 4), (4, 5)];
const TWO_TRIANGLES: &[(u64, u64)] = &[(1, 2), (1, 3), (2, 3), (4, 5), (4, 6), (5, 6)];
const MATCHING_OF_SIX: &[(u64, u64)] = &[(1, 2), (3, 4), (5, 6)];
const STAR_OF_FIVE: &[(u64, u64)] = &[(1, 2), (1, 3), (1, 4), (1, 5)];
const GRID_3X3: &[(u64, u64)] = &[
    (1, 2),
    (1, 4),
    (2, 3),
    (2, 5),
    (3, 6),
    (4, 5),
    (4, 7),
    (5, 6),
    (5, 8),
    (6, 9),
    (7, 8),
    (8, 9),
];

fn scenarios() -> Vec<(&'static str, &'static [(u64, u64)], u64)> {
    vec![
        ("path of five", PATH_OF_FIVE, 5),
        ("two triangles", TWO_TRIANGLES, 6),
        ("matching of six", MATCHING_OF_SIX, 6),
        ("star of five", STAR_OF_FIVE, 5),
        ("3x3 grid", GRID_3X3, 9),
    ]
}

#[test]
fn scenarios_semi_external() {
    for (name, edges, nodes) in scenarios() {
        let map = run_manager(edges, nodes, 1 << 20, 0, ContractionKind::Sibeyn, 42);
        check_against_oracle(edges, &map, name);
    }
}

#[test]
fn scenarios_fully_external_sibeyn() {
    for (name, edges, nodes) in scenarios() {
        for variant in [0u8, 2, 6, 8] {
            for seed in [0u64, 1, 99] {
                let map = run_manager(edges, nodes, 24, variant, ContractionKind::Sibeyn, seed);
                let context = format!("{} variant {} seed {}", name, variant, seed);
                check_against_oracle(edges, &map, &context);
            }
        }
    }
}

#[test]
fn scenarios_fully_external_boruvka() {
    for (name, edges, nodes) in scenarios() {
        let map = run_manager(edges, nodes, 24, 0, ContractionKind::Boruvka, 7);
        check_against_oracle(edges, &map, &format!("{} via boruvka", name));
    }
}

#[test]
fn scenarios_fully_external_star() {
    for (name, edges, nodes) in scenarios() {
        for seed in [0u64, 5] {
            let map = run_manager(edges, nodes, 24, 1, ContractionKind::Star, seed);
            check_against_oracle(edges, &map, &format!("{} via star, seed {}", name, seed));
        }
    }
}

#[test]
fn triangle_representatives_have_multiplicity_three() {
    let map = run_manager(TWO_TRIANGLES, 6, 1 << 20, 0, ContractionKind::Sibeyn, 9);
    let multiplicities = map.values().copied().counts();
    assert_eq!(multiplicities.len(), 2);
    assert!(multiplicities.values().all(|&count| count == 3));
}

#[test]
fn matching_representatives_are_pair_endpoints() {
    let map = run_manager(MATCHING_OF_SIX, 6, 1 << 20, 0, ContractionKind::Sibeyn, 1);
    let mut reps = BTreeSet::new();
    for pair in [(1u64, 2u64), (3, 4), (5, 6)] {
        assert_eq!(map[&pair.0], map[&pair.1]);
        let rep = map[&pair.0];
        assert!(rep == pair.0 || rep == pair.1);
        reps.insert(rep);
    }
    assert_eq!(reps.len(), 3);
}

#[test]
fn random_graphs_against_the_oracle() {
    // Seeded sparse random graphs, solved with a budget small enough to
    // recurse several levels deep.
    let mut state = 0x9e3779b97f4a7c15u64;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    for round in 0..5 {
        let nodes = 40 + round * 17;
        let mut set = BTreeSet::new();
        for _ in 0..(nodes * 3 / 2) {
            let u = next() % nodes + 1;
            let v = next() % nodes + 1;
            if u != v {
                let (u, v) = (u.min(v), u.max(v));
                set.insert((u, v));
            }
        }
        let edges: Vec<(u64, u64)> = set.into_iter().collect();
        for variant in [0u8, 6] {
            let map = run_manager(&edges, nodes, 128, variant, ContractionKind::Sibeyn, round);
            let context = format!("random round {} variant {}", round, variant);
            check_against_oracle(&edges, &map, &context);
        }
    }
}

#[test]
fn bundled_engine_matches_the_oracle() {
    let limits = Limits::default();
    for (name, edges, max_id) in scenarios() {
        for num_bundles in [1usize, 2, 3] {
            for minimize in [false, true] {
                let mut stream = edge_stream(edges, &limits);
                let mut engine =
                    SibeynWithBundles::new(&mut stream, max_id, num_bundles, minimize, &limits)
                        .unwrap();
                let mut map = BTreeMap::new();
                while !engine.empty() {
                    let entry = engine.peek();
                    map.insert(entry.node, entry.comp);
                    engine.advance().unwrap();
                }
                let context = format!("{} ({} bundles, minimize {})", name, num_bundles, minimize);
                check_against_oracle(edges, &map, &context);
            }
        }
    }
}
