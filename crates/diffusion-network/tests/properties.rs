//! End-to-end properties of the network subsystem, exercised through the
//! public API: factory, blueprint, graph, and topology schemes.

// Integration tests use unwrap extensively for clarity -- panicking on
// failure is the correct behavior in test code.
#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]

use std::collections::{BTreeMap, BTreeSet};

use diffusion_network::{
    AffinityMatrix, Collaborators, NetworkBlueprint, NetworkError, NetworkSpec, Parameters,
    Population, SocialNetwork, StrategySpec, factory,
};
use diffusion_types::{EdgeKey, GroupName, Medium, Node, NodeId};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::{SmallRng, StdRng};
use serde_json::json;

fn nodes(n: u128) -> Vec<Node> {
    (0..n)
        .map(|i| Node::new(NodeId::from_index(i), format!("agent-{i}")))
        .collect()
}

fn single_medium(key: &str, params: Parameters) -> NetworkBlueprint {
    NetworkBlueprint::new(false)
        .with_construction(Medium::Communication, factory::construction(key, &params).unwrap())
}

fn edge_set(graph: &SocialNetwork) -> BTreeSet<EdgeKey> {
    graph.edges().map(diffusion_types::Edge::key).collect()
}

#[test]
fn gilbert_mean_edge_count() {
    let mut rng = SmallRng::seed_from_u64(77);
    let builds = 100_u32;
    let total: usize = (0..builds)
        .map(|_| {
            single_medium("gilbert", Parameters::new().with("probability", 0.1))
                .build(nodes(30), Collaborators::none(), &mut rng)
                .unwrap()
                .graph()
                .edge_count()
        })
        .sum();
    let mean = total as f64 / f64::from(builds);
    // p·n·(n−1) = 87, standard error of the mean ≈ 0.88.
    assert!((mean - 87.0).abs() < 4.0, "mean {mean}");
}

#[test]
fn same_seed_same_network() {
    let spec = NetworkSpec {
        self_referential: false,
        media: BTreeMap::from([
            (Medium::Communication, StrategySpec::new("fixed_edge_count", Parameters::new().with("edges", 40))),
            (
                Medium::Trust,
                StrategySpec::new(
                    "barabasi_albert",
                    Parameters::new().with("seed_size", 3).with("edges_per_node", 2),
                ),
            ),
        ]),
        weights: StrategySpec::new("uniform", Parameters::new().with("lower", 0.1).with("upper", 0.9)),
        topology: StrategySpec::new("static", Parameters::new()),
    };
    let build = |seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        NetworkBlueprint::from_config(&spec)
            .unwrap()
            .build(nodes(25), Collaborators::none(), &mut rng)
            .unwrap()
    };
    let a = build(5);
    let b = build(5);
    let c = build(6);
    assert_eq!(edge_set(a.graph()), edge_set(b.graph()));
    let weights = |n: &diffusion_network::DiffusionNetwork| n.graph().edges().map(|e| e.weight.to_bits()).collect::<Vec<_>>();
    assert_eq!(weights(&a), weights(&b));
    assert_ne!(edge_set(a.graph()), edge_set(c.graph()));
}

#[test]
fn newcomer_attaches_uniformly_over_seed_clique() {
    let params = Parameters::new()
        .with("seed_size", 3)
        .with("edges_per_node", 1)
        .with("beta", 1.0);
    let newcomer = NodeId::from_index(3);
    let mut counts: BTreeMap<NodeId, usize> = BTreeMap::new();
    let mut rng = SmallRng::seed_from_u64(31);
    for _ in 0..1500 {
        let network = single_medium("barabasi_albert", params.clone())
            .build(nodes(4), Collaborators::none(), &mut rng)
            .unwrap();
        let out = network.graph().outgoing_edges(newcomer, Medium::Communication).unwrap();
        assert_eq!(out.len(), 1);
        *counts.entry(out[0].target).or_default() += 1;
    }
    assert_eq!(counts.len(), 3);
    assert!(counts.values().all(|&c| (400..=600).contains(&c)), "{counts:?}");
}

#[test]
fn heterogeneous_regular_through_factory() {
    let all = nodes(30);
    let groups = [GroupName::from("innovators"), GroupName::from("laggards"), GroupName::from("majority")];
    let mut population = Population::new(AffinityMatrix::uniform(&groups));
    for (node, group) in all.iter().zip(groups.iter().cycle()) {
        population.assign(node.id, group.clone()).unwrap();
    }
    let params = Parameters::new().with("out_degree", json!({"innovators": 5, "laggards": 1, "majority": 3}));
    let mut rng = SmallRng::seed_from_u64(8);
    let network = NetworkBlueprint::new(true)
        .with_construction(Medium::Trust, factory::construction("heterogeneous_regular", &params).unwrap())
        .build(all, Collaborators::none().with_population(&population), &mut rng)
        .unwrap();
    let graph = network.graph();
    let expected = [("innovators", 50), ("laggards", 10), ("majority", 30)];
    for (group, sum) in expected {
        let group = GroupName::from(group);
        let out: usize = population.members(&group).iter().map(|&m| graph.out_degree(m, Medium::Trust)).sum();
        assert_eq!(out, sum, "{group}");
        let incoming: Vec<usize> = population.members(&group).iter().map(|&m| graph.in_degree(m, Medium::Trust)).collect();
        let spread = incoming.iter().max().unwrap() - incoming.iter().min().unwrap();
        assert!(spread <= 1, "{group}: {incoming:?}");
    }
}

#[test]
fn heterogeneous_regular_balances_without_self_loops() {
    let all = nodes(30);
    let groups = [GroupName::from("early"), GroupName::from("majority"), GroupName::from("late")];
    let mut population = Population::new(AffinityMatrix::uniform(&groups));
    for (node, group) in all.iter().zip(groups.iter().cycle()) {
        population.assign(node.id, group.clone()).unwrap();
    }
    let params = Parameters::new().with("out_degree", 3);
    for seed in 0..100 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let network = single_medium("heterogeneous_regular", params.clone())
            .build(all.clone(), Collaborators::none().with_population(&population), &mut rng)
            .unwrap();
        let graph = network.graph();
        assert_eq!(graph.edge_count(), 90);
        for group in &groups {
            let incoming: Vec<usize> = population
                .members(group)
                .iter()
                .map(|&m| graph.in_degree(m, Medium::Communication))
                .collect();
            let spread = incoming.iter().max().unwrap() - incoming.iter().min().unwrap();
            assert!(spread <= 1, "seed {seed}, {group}: {incoming:?}");
        }
    }
}

#[test]
fn small_world_without_population_fails_cleanly() {
    let params = Parameters::new().with("out_degree", 2).with("rewire", 0.3);
    let mut rng = SmallRng::seed_from_u64(0);
    let result = single_medium("small_world", params).build(nodes(10), Collaborators::none(), &mut rng);
    assert!(matches!(
        result,
        Err(NetworkError::MissingCollaborator {
            strategy: "small_world",
            collaborator: "population"
        })
    ));
}

#[test]
fn independent_topology_with_certainty_inverts_graph() {
    let mut rng = SmallRng::seed_from_u64(2);
    let topology = factory::topology_scheme(
        "independent",
        &Parameters::new().with("delete_probability", 1.0).with("insert_probability", 1.0),
    )
    .unwrap();
    let mut network = single_medium("gilbert", Parameters::new().with("probability", 0.3))
        .with_topology(topology)
        .build(nodes(8), Collaborators::none(), &mut rng)
        .unwrap();
    let before = edge_set(network.graph());
    network.manipulate_topology(Medium::Communication, 1, &mut rng).unwrap();
    let after = edge_set(network.graph());
    assert!(before.is_disjoint(&after));
    assert_eq!(before.len() + after.len(), 56);
}

// ---------------------------------------------------------------------------
// Mutation invariants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Op {
    Add(u8, u8, bool),
    Remove(u8, u8, bool),
    Retarget(u8, u8, bool, u8),
    SwitchMedium(u8, u8, bool),
}

fn medium(trust: bool) -> Medium {
    if trust { Medium::Trust } else { Medium::Communication }
}

fn op() -> impl Strategy<Value = Op> {
    let node = 0_u8..6;
    prop_oneof![
        (node.clone(), node.clone(), any::<bool>()).prop_map(|(s, t, m)| Op::Add(s, t, m)),
        (node.clone(), node.clone(), any::<bool>()).prop_map(|(s, t, m)| Op::Remove(s, t, m)),
        (node.clone(), node.clone(), any::<bool>(), node.clone()).prop_map(|(s, t, m, n)| Op::Retarget(s, t, m, n)),
        (node.clone(), node, any::<bool>()).prop_map(|(s, t, m)| Op::SwitchMedium(s, t, m)),
    ]
}

fn id(i: u8) -> NodeId {
    NodeId::from_index(u128::from(i))
}

fn assert_consistent(graph: &SocialNetwork) {
    for m in Medium::ALL {
        let edges: Vec<_> = graph.edges_for(m).collect();
        assert_eq!(edges.len(), graph.edge_count_for(m));
        let out_total: usize = graph.node_ids().iter().map(|&n| graph.out_degree(n, m)).sum();
        assert_eq!(out_total, edges.len());
        let in_total: usize = graph.in_degrees(m).values().sum();
        assert_eq!(in_total, edges.len());
        for edge in edges {
            assert!(graph.neighbours(edge.source, m).unwrap().contains(&edge.target));
            assert_eq!(graph.retrieve_edge(edge.source, edge.target, m).unwrap(), edge);
            assert!(graph.allows_self_loops() || edge.source != edge.target);
        }
    }
    let keys: BTreeSet<_> = graph.edges().map(diffusion_types::Edge::key).collect();
    assert_eq!(keys.len(), graph.edge_count());
}

proptest! {
    #[test]
    fn graph_stays_consistent_under_mutation(
        ops in proptest::collection::vec(op(), 1..60),
        loops in any::<bool>(),
    ) {
        let mut graph = SocialNetwork::with_nodes(nodes(6), loops).unwrap();
        for op in ops {
            let before = graph.edge_count();
            match op {
                Op::Add(s, t, m) => {
                    let existed = graph.has_edge(id(s), id(t), medium(m));
                    let result = graph.connect(id(s), id(t), medium(m), 1.0);
                    if existed {
                        prop_assert!(matches!(result, Err(NetworkError::DuplicateEdge(_))));
                        prop_assert_eq!(graph.edge_count(), before);
                    } else if s == t && !loops {
                        prop_assert_eq!(result, Err(NetworkError::SelfLoopForbidden(id(s))));
                    } else {
                        prop_assert!(result.is_ok());
                        prop_assert_eq!(graph.edge_count(), before + 1);
                    }
                }
                Op::Remove(s, t, m) => {
                    let key = EdgeKey::new(id(s), id(t), medium(m));
                    let existed = graph.contains_edge(&key);
                    prop_assert_eq!(graph.remove_edge(&key).is_ok(), existed);
                    prop_assert_eq!(graph.edge_count(), if existed { before - 1 } else { before });
                }
                Op::Retarget(s, t, m, n) => {
                    let key = EdgeKey::new(id(s), id(t), medium(m));
                    if let Ok(moved) = graph.modify_edge_target(&key, id(n)) {
                        prop_assert!(graph.contains_edge(&moved));
                        prop_assert!(moved == key || !graph.contains_edge(&key));
                    }
                    prop_assert_eq!(graph.edge_count(), before);
                }
                Op::SwitchMedium(s, t, m) => {
                    let key = EdgeKey::new(id(s), id(t), medium(m));
                    let result = graph.modify_edge_medium(&key, medium(!m));
                    if result.is_ok() {
                        prop_assert!(!graph.contains_edge(&key));
                    }
                    prop_assert_eq!(graph.edge_count(), before);
                }
            }
            assert_consistent(&graph);
        }
    }
}
