//! The recursive subproblem manager.
//!
//! One engine drives the whole computation: it keeps a stack of per-level
//! scratch edge sequences and left/right component sorters, decides per
//! level whether to contract, samples the edge set into a left and a right
//! subproblem, solves the left recursively, relabels the right through the
//! left's components, solves the right, and merges everything back
//! together. Four shortcut paths are taken whenever the numbers allow:
//! piping a contraction straight into a pipelined base case, returning
//! immediately when contraction consumed every edge, solving the
//! contracted graph semi-externally, and collapsing both halves into one
//! base case when sampling reveals the node set fits after all.
//!
//! Every stage reports its sizes and duration through the stage logger.

use std::io;
use std::mem;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use emcc_logging::{StageEvent, StageLogger};
use emcc_storage::{ExternalSorter, Limits, Rewind, Streamer};

use crate::contraction::ContractionKind;
use crate::graph::{
    ByComponent, ByNode, Edge, EdgeByTarget, EdgeLex, Node, NodeComponent, MAX_EDGE, MAX_NODE,
};
use crate::kruskal::{PipelinedKruskal, StreamKruskal, MEMORY_OVERHEAD_FACTOR};
use crate::merger::merge_components;
use crate::policy::Policy;
use crate::relabel;
use crate::stream::{EdgeInput, EdgeStream, PowerOfTwoCoin, UniqueFilter};

const NODE_BYTES: u64 = std::mem::size_of::<Node>() as u64;

type CcSorter = ExternalSorter<NodeComponent, ByNode>;
type CcByCompSorter = ExternalSorter<NodeComponent, ByComponent>;
type EdgeSorter = ExternalSorter<Edge, EdgeLex>;

/// The recursive connected-components engine.
///
/// Construction fixes the memory budget, policy, contraction strategy and
/// seed; [`run`](SubproblemManager::run) then maps any number of edge
/// streams to their component maps deterministically.
pub struct SubproblemManager {
    limits: Limits,
    memory_bytes: u64,
    policy: Policy,
    contraction: ContractionKind,
    rng: SmallRng,
    logger: StageLogger,
    sub_edges: Vec<EdgeStream>,
    ccs_left: Vec<CcSorter>,
    ccs_right: Vec<CcSorter>,
}

impl SubproblemManager {
    /// An engine with the given budget, policy and contraction strategy.
    pub fn new(
        memory_bytes: u64,
        policy: Policy,
        contraction: ContractionKind,
        seed: u64,
        limits: &Limits,
        logger: StageLogger,
    ) -> Self {
        SubproblemManager {
            limits: limits.clone(),
            memory_bytes,
            policy,
            contraction,
            rng: SmallRng::seed_from_u64(seed),
            logger,
            sub_edges: Vec::new(),
            ccs_left: Vec::new(),
            ccs_right: Vec::new(),
        }
    }

    /// Computes the component map of `edges`, a consumed, sorted,
    /// loop-free, deduplicated edge stream over at most `num_nodes` nodes.
    ///
    /// The input stream is consumed destructively; its storage may be
    /// released before the run completes.
    pub fn run(&mut self, edges: &mut EdgeStream, num_nodes: u64) -> io::Result<ComponentMap> {
        let logger = self.logger.clone();
        let timer = logger.stage("total", edges.len());
        edges.rewind()?;
        #[cfg(debug_assertions)]
        {
            assert!(crate::stream::checks::is_sorted::<_, EdgeLex>(edges)?);
        }
        self.ensure_level(0);
        self.process(edges, num_nodes, 0, true)?;
        let out = self.take_cc(true, 0);
        timer.finish(out.len());
        logger.flush();
        ComponentMap::new(out)
    }

    fn ensure_level(&mut self, level: usize) {
        while self.sub_edges.len() <= level + 1 {
            self.sub_edges.push(EdgeStream::new(&self.limits));
        }
        while self.ccs_left.len() <= level + 1 {
            self.ccs_left.push(CcSorter::new(&self.limits));
            self.ccs_right.push(CcSorter::new(&self.limits));
        }
    }

    /// The semi-external gate: the nodes fit the union-find budget, or the
    /// edges fit memory outright.
    fn semi_external_nodes(&self, nodes: u64) -> bool {
        nodes.saturating_mul(NODE_BYTES * MEMORY_OVERHEAD_FACTOR) <= self.memory_bytes
    }

    fn semi_external(&self, nodes: u64, edges: u64) -> bool {
        self.semi_external_nodes(nodes)
            || edges.saturating_mul(2 * NODE_BYTES) <= self.memory_bytes
    }

    /// The memory budget in nodes, as handed to the policy.
    fn policy_budget(&self) -> u64 {
        self.memory_bytes / (NODE_BYTES * MEMORY_OVERHEAD_FACTOR)
    }

    fn take_cc(&mut self, left: bool, level: usize) -> CcSorter {
        let slot = if left {
            &mut self.ccs_left[level]
        } else {
            &mut self.ccs_right[level]
        };
        mem::replace(slot, CcSorter::new(&self.limits))
    }

    fn put_cc(&mut self, left: bool, level: usize, sorter: CcSorter) {
        if left {
            self.ccs_left[level] = sorter;
        } else {
            self.ccs_right[level] = sorter;
        }
    }

    fn clear_child_ccs(&mut self, level: usize) {
        self.ccs_left[level + 1].clear();
        self.ccs_right[level + 1].clear();
    }

    /// Solves one subproblem, filling the component sorter of
    /// `(left, level)`. Returns `(nodes seen, components found)`, both as
    /// upper bounds usable for the caller's arithmetic.
    fn process<E: EdgeInput>(
        &mut self,
        in_edges: &mut E,
        n_bound: u64,
        level: usize,
        left: bool,
    ) -> io::Result<(u64, u64)> {
        self.ensure_level(level);
        self.logger.log(StageEvent {
            operation: "call",
            input_size: n_bound,
            output_size: in_edges.len(),
            micros: 0,
        });
        if self.semi_external(n_bound, in_edges.len()) {
            let logger = self.logger.clone();
            let timer = logger.stage("basecase", in_edges.len());
            let mut out = self.take_cc(left, level);
            debug_assert_eq!(out.len(), 0);
            let mut kruskal = StreamKruskal::new();
            {
                let mut unique = UniqueFilter::new(in_edges);
                kruskal.consume(&mut unique)?;
            }
            kruskal.finish(&mut out)?;
            out.sort_reuse()?;
            timer.finish(out.len());
            self.put_cc(left, level, out);
            Ok((kruskal.nodes(), kruskal.components()))
        } else {
            self.fully_external(in_edges, n_bound, level, left)
        }
    }

    fn fully_external<E: EdgeInput>(
        &mut self,
        in_edges: &mut E,
        n_bound: u64,
        level: usize,
        left: bool,
    ) -> io::Result<(u64, u64)> {
        let m = in_edges.len();
        let n2 = n_bound.min(m.saturating_mul(2));
        if m == 0 {
            self.clear_child_ccs(level);
            return Ok((0, 0));
        }
        let budget = self.policy_budget();
        if self.policy.should_contract(n2, m, level, budget) {
            self.contract_and_solve(in_edges, n2, level, left)
        } else {
            self.sample_and_solve(in_edges, n_bound, level, left)
        }
    }

    /// The contraction arm of the fully external case.
    fn contract_and_solve<E: EdgeInput>(
        &mut self,
        in_edges: &mut E,
        n2: u64,
        level: usize,
        left: bool,
    ) -> io::Result<(u64, u64)> {
        let limits = self.limits.clone();
        let logger = self.logger.clone();
        let contraction = self.contraction;
        let m = in_edges.len();
        let budget = self.policy_budget();
        let goal = self.policy.contract_count(n2, m, level, budget);
        let mut contraction_map = CcByCompSorter::new(&limits);

        // Pipe the contraction into a pipelined base case when what is
        // left of the node set fits memory anyway.
        if contraction.supports_only_map_return() && self.semi_external_nodes(n2.saturating_sub(goal))
        {
            let timer = logger.stage("contraction", m);
            let mut kruskal = PipelinedKruskal::new();
            {
                let mut unique = UniqueFilter::new(in_edges);
                contraction.semi_external(
                    &mut unique,
                    goal,
                    &mut contraction_map,
                    &mut kruskal,
                    &mut self.rng,
                    &limits,
                )?;
            }
            contraction_map.sort_reuse()?;
            let contraction_len = contraction_map.len();
            timer.finish(contraction_len);

            let mut ccs_contracted = CcSorter::new(&limits);
            kruskal.finish(&mut ccs_contracted)?;
            ccs_contracted.sort_reuse()?;

            let merge_timer = logger.stage("merging", contraction_len + ccs_contracted.len());
            let mut out = self.take_cc(left, level);
            merge_components(&mut contraction_map, &mut ccs_contracted, &mut out)?;
            out.sort_reuse()?;
            merge_timer.finish(out.len());
            self.put_cc(left, level, out);
            self.clear_child_ccs(level);
            return Ok((kruskal.nodes() + contraction_len, kruskal.components()));
        }

        let timer = logger.stage("contraction", m);
        let mut contracted = EdgeSorter::new(&limits);
        {
            let mut unique = UniqueFilter::new(in_edges);
            contraction.fully_external(
                &mut unique,
                goal,
                &mut contracted,
                &mut contraction_map,
                &mut self.rng,
                &limits,
            )?;
        }
        in_edges.reset()?;
        contracted.sort_reuse()?;
        contraction_map.sort_reuse()?;
        let n_contracted = n2.saturating_sub(goal).min(contracted.len().saturating_mul(2));
        timer.finish(contracted.len());

        // The contraction consumed every edge: its map is the answer.
        if contracted.len() == 0 {
            let mut out = self.take_cc(left, level);
            emcc_storage::stream_into(&mut contraction_map, &mut out)?;
            out.sort_reuse()?;
            let produced = out.len();
            self.put_cc(left, level, out);
            self.clear_child_ccs(level);
            return Ok((produced, produced));
        }

        // The contracted graph fits the base case: solve it right here.
        if self.semi_external(n_contracted, contracted.len()) {
            let base_timer = logger.stage("basecase", contracted.len());
            let mut ccs_contracted = CcSorter::new(&limits);
            let mut kruskal = StreamKruskal::new();
            {
                let mut unique = UniqueFilter::new(&mut contracted);
                kruskal.consume(&mut unique)?;
            }
            kruskal.finish(&mut ccs_contracted)?;
            ccs_contracted.sort_reuse()?;
            base_timer.finish(ccs_contracted.len());

            let merge_timer =
                logger.stage("merging", contraction_map.len() + ccs_contracted.len());
            let mut out = self.take_cc(left, level);
            merge_components(&mut contraction_map, &mut ccs_contracted, &mut out)?;
            out.sort_reuse()?;
            merge_timer.finish(out.len());
            self.put_cc(left, level, out);
            self.clear_child_ccs(level);
            return Ok((kruskal.nodes(), kruskal.components()));
        }

        // Sample the contracted edges into the two subproblems.
        let bits = self
            .policy
            .sample_bits(n_contracted, contracted.len(), level, budget);
        let contracted_len = contracted.len();
        let (c_all, c_left, c_right, c_common) = {
            let mut unique = UniqueFilter::new(&mut contracted);
            self.sample_edges(&mut unique, level, bits, contracted_len)?
        };
        contracted.clear();

        let n_all = n_contracted.min(c_all);
        let n_left = n_all.min(c_left);
        let mut n_right = n_all.min(c_right);

        // Sampling revealed the node set fits memory after all.
        if self.semi_external_nodes(c_all) {
            let (nodes, components) = {
                let base_timer = logger.stage("basecase", contracted_len);
                let mut left_edges =
                    mem::replace(&mut self.sub_edges[level + 1], EdgeStream::new(&limits));
                let mut right_edges =
                    mem::replace(&mut self.sub_edges[level], EdgeStream::new(&limits));
                let mut ccs_contracted = CcSorter::new(&limits);
                let mut kruskal = StreamKruskal::new();
                {
                    let mut unique = UniqueFilter::new(&mut left_edges);
                    kruskal.consume(&mut unique)?;
                }
                {
                    let mut unique = UniqueFilter::new(&mut right_edges);
                    kruskal.consume(&mut unique)?;
                }
                kruskal.finish(&mut ccs_contracted)?;
                ccs_contracted.sort_reuse()?;
                base_timer.finish(ccs_contracted.len());

                let merge_timer =
                    logger.stage("merging", contraction_map.len() + ccs_contracted.len());
                let mut out = self.take_cc(left, level);
                merge_components(&mut contraction_map, &mut ccs_contracted, &mut out)?;
                out.sort_reuse()?;
                merge_timer.finish(out.len());
                self.put_cc(left, level, out);
                (kruskal.nodes(), kruskal.components())
            };
            self.clear_child_ccs(level);
            return Ok((nodes, components));
        }

        // Left, right, then merge twice: left with right, and the result
        // with the contraction map.
        let (n_l, cc_l) = self.process_left(level, n_left)?;
        n_right = n_right
            .min(n_right.saturating_sub(c_common).saturating_add(cc_l))
            .min(n_all.saturating_sub(n_l).saturating_add(cc_l));

        let mut left_by_comp = CcByCompSorter::new(&limits);
        let (_n_r, cc_r) = self.process_right(level, n_right, &mut left_by_comp)?;

        let merge_timer = logger.stage("merging", left_by_comp.len());
        let mut without_stars = CcSorter::new(&limits);
        left_by_comp.sort_reuse()?;
        let mut right_ccs = self.take_cc(false, level + 1);
        merge_components(&mut left_by_comp, &mut right_ccs, &mut without_stars)?;
        without_stars.sort_reuse()?;
        right_ccs.clear();
        self.put_cc(false, level + 1, right_ccs);

        let mut out = self.take_cc(left, level);
        merge_components(&mut contraction_map, &mut without_stars, &mut out)?;
        out.sort_reuse()?;
        merge_timer.finish(out.len());
        let produced = out.len();
        self.put_cc(left, level, out);
        self.clear_child_ccs(level);
        Ok((produced, cc_l + cc_r))
    }

    /// The no-contraction arm of the fully external case.
    fn sample_and_solve<E: EdgeInput>(
        &mut self,
        in_edges: &mut E,
        n_bound: u64,
        level: usize,
        left: bool,
    ) -> io::Result<(u64, u64)> {
        let limits = self.limits.clone();
        let logger = self.logger.clone();
        let m = in_edges.len();
        let budget = self.policy_budget();
        let bits = self.policy.sample_bits(n_bound, m, level, budget);
        let (c_all, c_left, c_right, c_common) = {
            let mut unique = UniqueFilter::new(in_edges);
            self.sample_edges(&mut unique, level, bits, m)?
        };
        in_edges.reset()?;

        // Sampling revealed the node set fits memory after all.
        if self.semi_external_nodes(c_all) {
            let base_timer = logger.stage("basecase", m);
            let mut left_edges =
                mem::replace(&mut self.sub_edges[level + 1], EdgeStream::new(&limits));
            let mut right_edges =
                mem::replace(&mut self.sub_edges[level], EdgeStream::new(&limits));
            let mut kruskal = StreamKruskal::new();
            {
                let mut unique = UniqueFilter::new(&mut left_edges);
                kruskal.consume(&mut unique)?;
            }
            {
                let mut unique = UniqueFilter::new(&mut right_edges);
                kruskal.consume(&mut unique)?;
            }
            let mut out = self.take_cc(left, level);
            kruskal.finish(&mut out)?;
            out.sort_reuse()?;
            base_timer.finish(out.len());
            self.put_cc(left, level, out);
            self.clear_child_ccs(level);
            return Ok((kruskal.nodes(), kruskal.components()));
        }

        let (n_l, cc_l) = self.process_left(level, n_bound.min(c_left))?;
        let right_bound = c_right
            .min(c_right.saturating_sub(c_common).saturating_add(cc_l))
            .min(c_all.saturating_sub(n_l).saturating_add(cc_l))
            .min(n_bound)
            .min(n_bound.saturating_sub(n_l).saturating_add(cc_l));

        let mut left_by_comp = CcByCompSorter::new(&limits);
        let (_n_r, cc_r) = self.process_right(level, right_bound, &mut left_by_comp)?;

        let merge_timer = logger.stage("merging", left_by_comp.len());
        left_by_comp.sort_reuse()?;
        let mut right_ccs = self.take_cc(false, level + 1);
        let mut out = self.take_cc(left, level);
        merge_components(&mut left_by_comp, &mut right_ccs, &mut out)?;
        out.sort_reuse()?;
        right_ccs.clear();
        self.put_cc(false, level + 1, right_ccs);
        let produced = out.len();
        self.put_cc(left, level, out);
        merge_timer.finish(produced);
        self.clear_child_ccs(level);
        Ok((produced, cc_l + cc_r))
    }

    /// Solves the sampled half, whose edges wait in the level-below scratch.
    fn process_left(&mut self, level: usize, bound: u64) -> io::Result<(u64, u64)> {
        let mut edges = mem::replace(&mut self.sub_edges[level + 1], EdgeStream::new(&self.limits));
        self.process(&mut edges, bound, level + 1, true)
        // dropping `edges` releases the level's scratch
    }

    /// Relabels the unsampled half through the left components and solves
    /// it, recursively or fused into a base case.
    fn process_right(
        &mut self,
        level: usize,
        bound: u64,
        left_by_comp: &mut CcByCompSorter,
    ) -> io::Result<(u64, u64)> {
        let limits = self.limits.clone();
        let logger = self.logger.clone();
        let mut right_edges = mem::replace(&mut self.sub_edges[level], EdgeStream::new(&limits));

        if self.semi_external(bound, right_edges.len()) {
            // Fuse the relabelling with the base case: rewrite sources into
            // a by-target sorter, then rewrite targets straight into a
            // pipelined Kruskal.
            let timer = logger.stage("relabelling", right_edges.len());
            let mut left_ccs = self.take_cc(true, level + 1);
            let mut by_target = ExternalSorter::<Edge, EdgeByTarget>::new(&limits);
            relabel::relabel_sources_echo(
                &mut left_ccs,
                &mut right_edges,
                &mut by_target,
                left_by_comp,
            )?;
            right_edges.clear();
            by_target.sort_reuse()?;

            left_ccs.rewind()?;
            let mut kruskal = PipelinedKruskal::new();
            {
                let mut unique = UniqueFilter::new(&mut by_target);
                relabel::relabel_targets(&mut left_ccs, &mut unique, &mut kruskal)?;
            }
            by_target.clear();
            timer.finish(kruskal.nodes());
            self.put_cc(true, level + 1, left_ccs);

            let mut out = self.take_cc(false, level + 1);
            kruskal.finish(&mut out)?;
            out.sort_reuse()?;
            self.put_cc(false, level + 1, out);
            Ok((kruskal.nodes(), kruskal.components()))
        } else {
            let mut relabelled = EdgeSorter::new(&limits);
            let n_relabel = self.relabel_right(level, left_by_comp, &mut relabelled, right_edges)?;
            self.process(&mut relabelled, n_relabel.min(bound), level + 1, false)
        }
    }

    /// The full relabelling chain: sources, re-sort by target, targets.
    ///
    /// Returns an upper bound on the relabelled node count, obtained by
    /// counting source changes on the first pass and target changes on the
    /// second.
    fn relabel_right(
        &mut self,
        level: usize,
        left_by_comp: &mut CcByCompSorter,
        out: &mut EdgeSorter,
        mut right_edges: EdgeStream,
    ) -> io::Result<u64> {
        let limits = self.limits.clone();
        let logger = self.logger.clone();
        let timer = logger.stage("relabelling", right_edges.len());
        let mut left_ccs = self.take_cc(true, level + 1);
        let mut bound = 0u64;

        // Pass 1: sources, echoing the map into the by-component sorter.
        let mut by_target = ExternalSorter::<Edge, EdgeByTarget>::new(&limits);
        {
            let mut map = UniqueFilter::new(&mut left_ccs);
            let mut last_source = MAX_NODE;
            while !map.empty() {
                let entry = map.peek();
                left_by_comp.push(entry)?;
                while !right_edges.empty() {
                    let edge = right_edges.peek();
                    bound += (last_source != edge.u) as u64;
                    last_source = edge.u;
                    if edge.u < entry.node {
                        debug_assert!(!edge.is_self_loop());
                        by_target.push(edge)?;
                    } else if edge.u == entry.node {
                        if entry.comp == edge.v {
                            right_edges.advance()?;
                            continue;
                        }
                        by_target.push(Edge::new(entry.comp, edge.v))?;
                    } else {
                        break;
                    }
                    right_edges.advance()?;
                }
                map.advance()?;
            }
            while !right_edges.empty() {
                let edge = right_edges.peek();
                bound += (last_source != edge.u) as u64;
                last_source = edge.u;
                by_target.push(edge)?;
                right_edges.advance()?;
            }
        }
        right_edges.clear();
        by_target.sort_reuse()?;

        // Pass 2: targets, normalizing and counting target changes.
        left_ccs.rewind()?;
        {
            let mut map = UniqueFilter::new(&mut left_ccs);
            let mut unique_edges = UniqueFilter::new(&mut by_target);
            let mut last_target = MAX_NODE;
            while !map.empty() {
                let entry = map.peek();
                while !unique_edges.empty() {
                    let edge = unique_edges.peek();
                    bound += (last_target != edge.v) as u64;
                    last_target = edge.v;
                    if edge.v < entry.node {
                        debug_assert!(!edge.is_self_loop());
                        out.push(edge.normalized())?;
                    } else if edge.v == entry.node {
                        if entry.comp == edge.u {
                            unique_edges.advance()?;
                            continue;
                        }
                        out.push(Edge::new(edge.u, entry.comp).normalized())?;
                    } else {
                        break;
                    }
                    unique_edges.advance()?;
                }
                map.advance()?;
            }
            while !unique_edges.empty() {
                let edge = unique_edges.peek();
                bound += (last_target != edge.v) as u64;
                last_target = edge.v;
                debug_assert!(!edge.is_self_loop());
                out.push(edge.normalized())?;
                unique_edges.advance()?;
            }
        }
        by_target.clear();
        self.put_cc(true, level + 1, left_ccs);
        out.sort_reuse()?;
        timer.finish(out.len());
        Ok(bound)
    }

    /// Splits a sorted edge stream by a `2^-bits` coin into the sampled
    /// scratch of the level below and the unsampled scratch of this level.
    ///
    /// Four counters of endpoint changes produce combinatorial node upper
    /// bounds: for the whole stream, each half, and the sources feeding
    /// both halves.
    fn sample_edges<S: Streamer<Item = Edge>>(
        &mut self,
        input: &mut S,
        level: usize,
        bits: u32,
        input_len: u64,
    ) -> io::Result<(u64, u64, u64, u64)> {
        let limits = self.limits.clone();
        let logger = self.logger.clone();
        let timer = logger.stage("sampling", input_len);

        let mut left_seq = mem::replace(&mut self.sub_edges[level + 1], EdgeStream::new(&limits));
        debug_assert!(left_seq.is_empty());
        let mut right_seq = EdgeStream::new(&limits);

        let mut coin = PowerOfTwoCoin::new(bits);
        let mut edge_all = MAX_EDGE;
        let mut edge_left = MAX_EDGE;
        let mut edge_right = MAX_EDGE;
        let mut source_all = true;
        let mut source_left = false;
        let mut source_right = false;
        let mut count_all = 0u64;
        let mut count_left = 0u64;
        let mut count_right = 0u64;
        let mut count_common = 0u64;

        fn bump(count: &mut u64, current: &mut Edge, next: Edge) {
            *count += (current.u != next.u) as u64 + (current.v != next.v) as u64;
            *current = next;
        }

        while !input.empty() {
            let edge = input.peek();
            source_all = source_all || edge.u != edge_all.u;
            source_left = source_left && edge.u == edge_all.u;
            source_right = source_right && edge.u == edge_all.u;
            bump(&mut count_all, &mut edge_all, edge);
            if coin.flip(&mut self.rng) {
                source_left = true;
                left_seq.push(edge)?;
                bump(&mut count_left, &mut edge_left, edge);
            } else {
                source_right = true;
                right_seq.push(edge)?;
                bump(&mut count_right, &mut edge_right, edge);
            }
            count_common += (source_left && source_right && source_all) as u64;
            source_all = !(source_left && source_right);
            input.advance()?;
        }

        left_seq.consume()?;
        right_seq.consume()?;
        timer.finish(left_seq.len());
        self.sub_edges[level + 1] = left_seq;
        self.sub_edges[level] = right_seq;
        Ok((count_all, count_left, count_right, count_common))
    }
}

/// The engine's output: `(node, representative)` pairs sorted by node with
/// duplicate suppression on advance.
pub struct ComponentMap {
    ccs: CcSorter,
    current: Option<NodeComponent>,
}

impl ComponentMap {
    fn new(ccs: CcSorter) -> io::Result<Self> {
        let current = if Streamer::empty(&ccs) {
            None
        } else {
            Some(ccs.peek())
        };
        Ok(ComponentMap { ccs, current })
    }

    /// The number of underlying entries, duplicates included.
    pub fn entries(&self) -> u64 {
        self.ccs.len()
    }
}

impl Streamer for ComponentMap {
    type Item = NodeComponent;

    fn empty(&self) -> bool {
        self.current.is_none()
    }

    fn peek(&self) -> NodeComponent {
        match self.current {
            Some(entry) => entry,
            None => panic!("peek past the end of a component map"),
        }
    }

    fn advance(&mut self) -> io::Result<()> {
        let last = self.peek();
        loop {
            self.ccs.advance()?;
            if Streamer::empty(&self.ccs) {
                self.current = None;
                return Ok(());
            }
            let next = self.ccs.peek();
            if next.node != last.node {
                self.current = Some(next);
                return Ok(());
            }
            debug_assert_eq!(next.comp, last.comp);
        }
    }
}

impl Rewind for ComponentMap {
    fn rewind(&mut self) -> io::Result<()> {
        self.ccs.rewind()?;
        self.current = if Streamer::empty(&self.ccs) {
            None
        } else {
            Some(self.ccs.peek())
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn solve(
        edges: &[(u64, u64)],
        num_nodes: u64,
        memory: u64,
        variant: u8,
        contraction: ContractionKind,
        seed: u64,
    ) -> BTreeMap<u64, u64> {
        let limits = Limits::default();
        let mut stream = EdgeStream::new(&limits);
        for &(u, v) in edges {
            stream.push(Edge::new(u, v)).unwrap();
        }
        stream.consume().unwrap();
        let mut manager = SubproblemManager::new(
            memory,
            Policy::variant(variant),
            contraction,
            seed,
            &limits,
            StageLogger::disabled(),
        );
        let mut map = manager.run(&mut stream, num_nodes).unwrap();
        let mut result = BTreeMap::new();
        while !map.empty() {
            let entry = map.peek();
            assert!(result.insert(entry.node, entry.comp).is_none());
            map.advance().unwrap();
        }
        result
    }

    #[test]
    fn path_of_five_collapses_semi_externally() {
        // A generous budget routes this straight into the base case.
        let map = solve(&[(1, 2), (2, 3), (3, 4), (4, 5)], 5, 1 << 20, 0, ContractionKind::Sibeyn, 1);
        assert_eq!(map.len(), 5);
        let root = map[&1];
        assert!(map.values().all(|&c| c == root));
    }

    #[test]
    fn path_of_five_collapses_fully_externally() {
        // A 32-byte budget forces contraction, sampling and recursion.
        for variant in [0u8, 2, 6] {
            for seed in [1u64, 7, 1234] {
                let map = solve(
                    &[(1, 2), (2, 3), (3, 4), (4, 5)],
                    5,
                    32,
                    variant,
                    ContractionKind::Sibeyn,
                    seed,
                );
                assert_eq!(map.len(), 5, "variant {} seed {}", variant, seed);
                let root = map[&1];
                assert!(
                    map.values().all(|&c| c == root),
                    "variant {} seed {}",
                    variant,
                    seed
                );
            }
        }
    }

    #[test]
    fn star_shape_of_the_output() {
        let map = solve(
            &[(1, 2), (2, 3), (1, 3), (4, 5), (5, 6), (4, 6)],
            6,
            64,
            0,
            ContractionKind::Sibeyn,
            3,
        );
        // Two triangles, two representatives, each its own image.
        assert_eq!(map.len(), 6);
        for (&node, &comp) in &map {
            assert_eq!(map[&comp], comp, "rep of {} is not a fixed point", node);
        }
        let mut reps: Vec<u64> = map.values().copied().collect();
        reps.sort();
        reps.dedup();
        assert_eq!(reps.len(), 2);
    }
}
