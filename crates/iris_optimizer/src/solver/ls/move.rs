use std::{fmt::Debug, marker::PhantomData};

use smallvec::SmallVec;

use crate::{
    problem::{
        eval::Eval, job::JobIdx, units::Cost, vehicle::VehicleIdx,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::{
        ls::{
            cross_exchange::CrossExchangeOperator,
            exchange::ExchangeOperator,
            intra_cross_exchange::IntraCrossExchangeOperator,
            intra_exchange::IntraExchangeOperator,
            intra_mixed_exchange::IntraMixedExchangeOperator,
            intra_or_opt::IntraOrOptOperator,
            intra_relocate::IntraRelocateOperator,
            intra_two_opt::IntraTwoOptOperator,
            mixed_exchange::MixedExchangeOperator,
            or_opt::OrOptOperator,
            pd_shift::PdShiftOperator,
            relocate::RelocateOperator,
            reverse_two_opt::ReverseTwoOptOperator,
            route_change::{RouteChanges, apply_changes, changes_are_valid, changes_gain},
            route_exchange::RouteExchangeOperator,
            route_split::RouteSplitOperator,
            search_context::SearchContext,
            swap_star::SwapStarOperator,
            two_opt::TwoOptOperator,
            unassigned_exchange::UnassignedExchangeOperator,
        },
        neighbours::Neighbours,
        solution::{
            solution_state::SolutionState, working_route::WorkingRoute,
            working_solution::WorkingSolution,
        },
    },
};

pub type RoutePair = (VehicleIdx, VehicleIdx);

/// Jobs swapped between a route and the unassigned set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnassignedChange {
    pub assigned: JobIdx,
    pub unassigned: JobIdx,
}

pub trait LocalSearchOperator: Sized + Debug {
    const NAME: &'static str;

    /// Feeds `consumer` with every candidate move on the route pair. Moves
    /// are structural candidates only, gain and validity are checked later.
    fn generate_moves<R, C>(ctx: &SearchContext<R>, pair: RoutePair, consumer: C)
    where
        R: WorkingRoute,
        C: FnMut(Self);

    fn route_changes<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> RouteChanges;

    fn unassigned_change(&self) -> Option<UnassignedChange> {
        None
    }

    fn gain<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> Eval {
        changes_gain(ctx, &self.route_changes(ctx))
    }

    fn is_valid<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> bool {
        changes_are_valid(ctx, &self.route_changes(ctx))
    }
}

macro_rules! local_search_moves {
    ($($variant:ident($operator:ty)),+ $(,)?) => {
        #[derive(Debug)]
        pub enum LocalSearchMove {
            $($variant($operator)),+
        }

        $(
            impl From<$operator> for LocalSearchMove {
                fn from(operator: $operator) -> Self {
                    LocalSearchMove::$variant(operator)
                }
            }
        )+

        impl LocalSearchMove {
            pub fn operator_name(&self) -> &'static str {
                match self {
                    $(LocalSearchMove::$variant(_) => <$operator as LocalSearchOperator>::NAME),+
                }
            }

            pub fn route_changes<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> RouteChanges {
                match self {
                    $(LocalSearchMove::$variant(op) => op.route_changes(ctx)),+
                }
            }

            pub fn unassigned_change(&self) -> Option<UnassignedChange> {
                match self {
                    $(LocalSearchMove::$variant(op) => op.unassigned_change()),+
                }
            }

            pub fn gain<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> Eval {
                match self {
                    $(LocalSearchMove::$variant(op) => op.gain(ctx)),+
                }
            }

            pub fn is_valid<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> bool {
                match self {
                    $(LocalSearchMove::$variant(op) => op.is_valid(ctx)),+
                }
            }
        }
    };
}

local_search_moves!(
    UnassignedExchange(UnassignedExchangeOperator),
    CrossExchange(CrossExchangeOperator),
    MixedExchange(MixedExchangeOperator),
    TwoOpt(TwoOptOperator),
    ReverseTwoOpt(ReverseTwoOptOperator),
    Relocate(RelocateOperator),
    OrOpt(OrOptOperator),
    Exchange(ExchangeOperator),
    IntraExchange(IntraExchangeOperator),
    IntraCrossExchange(IntraCrossExchangeOperator),
    IntraMixedExchange(IntraMixedExchangeOperator),
    IntraRelocate(IntraRelocateOperator),
    IntraOrOpt(IntraOrOptOperator),
    IntraTwoOpt(IntraTwoOptOperator),
    PdShift(PdShiftOperator),
    RouteExchange(RouteExchangeOperator),
    SwapStar(SwapStarOperator),
    RouteSplit(RouteSplitOperator),
);

impl LocalSearchMove {
    /// Applies the move and returns the modified routes. The caller refreshes
    /// the solution state for each of them.
    pub fn apply<R: WorkingRoute>(
        &self,
        problem: &VehicleRoutingProblem,
        neighbours: &Neighbours,
        solution: &mut WorkingSolution<R>,
        state: &SolutionState,
    ) -> SmallVec<[VehicleIdx; 3]> {
        let changes = self.route_changes(&SearchContext {
            problem,
            neighbours,
            solution,
            state,
        });

        apply_changes(problem, solution, &changes);
        if let Some(change) = self.unassigned_change() {
            solution.mark_assigned(change.assigned);
            solution.mark_unassigned(change.unassigned);
        }

        changes.iter().map(|change| change.vehicle_id).collect()
    }
}

/// One family of moves the search scans, in a fixed catalogue order.
pub trait Neighbourhood<R: WorkingRoute>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Best valid move on `pair` with a cost gain strictly above `min_gain`.
    /// Ties keep the first generated move.
    fn best_move(
        &self,
        ctx: &SearchContext<R>,
        pair: RoutePair,
        min_gain: Cost,
    ) -> Option<(Eval, LocalSearchMove)>;
}

pub struct OperatorNeighbourhood<O> {
    _marker: PhantomData<fn() -> O>,
}

impl<O> Default for OperatorNeighbourhood<O> {
    fn default() -> Self {
        OperatorNeighbourhood {
            _marker: PhantomData,
        }
    }
}

impl<R, O> Neighbourhood<R> for OperatorNeighbourhood<O>
where
    R: WorkingRoute,
    O: LocalSearchOperator + Into<LocalSearchMove>,
{
    fn name(&self) -> &'static str {
        O::NAME
    }

    fn best_move(
        &self,
        ctx: &SearchContext<R>,
        pair: RoutePair,
        min_gain: Cost,
    ) -> Option<(Eval, LocalSearchMove)> {
        let mut best_gain = min_gain;
        let mut best: Option<(Eval, O)> = None;

        O::generate_moves(ctx, pair, |op| {
            let gain = op.gain(ctx);
            if gain.cost > best_gain && op.is_valid(ctx) {
                best_gain = gain.cost;
                best = Some((gain, op));
            }
        });

        best.map(|(gain, op)| (gain, op.into()))
    }
}

/// Every neighbourhood, in tie-break order.
pub fn default_neighbourhoods<R: WorkingRoute>() -> Vec<Box<dyn Neighbourhood<R>>> {
    vec![
        Box::new(OperatorNeighbourhood::<UnassignedExchangeOperator>::default()),
        Box::new(OperatorNeighbourhood::<CrossExchangeOperator>::default()),
        Box::new(OperatorNeighbourhood::<MixedExchangeOperator>::default()),
        Box::new(OperatorNeighbourhood::<TwoOptOperator>::default()),
        Box::new(OperatorNeighbourhood::<ReverseTwoOptOperator>::default()),
        Box::new(OperatorNeighbourhood::<RelocateOperator>::default()),
        Box::new(OperatorNeighbourhood::<OrOptOperator>::default()),
        Box::new(OperatorNeighbourhood::<ExchangeOperator>::default()),
        Box::new(OperatorNeighbourhood::<IntraExchangeOperator>::default()),
        Box::new(OperatorNeighbourhood::<IntraCrossExchangeOperator>::default()),
        Box::new(OperatorNeighbourhood::<IntraMixedExchangeOperator>::default()),
        Box::new(OperatorNeighbourhood::<IntraRelocateOperator>::default()),
        Box::new(OperatorNeighbourhood::<IntraOrOptOperator>::default()),
        Box::new(OperatorNeighbourhood::<IntraTwoOptOperator>::default()),
        Box::new(OperatorNeighbourhood::<PdShiftOperator>::default()),
        Box::new(OperatorNeighbourhood::<RouteExchangeOperator>::default()),
        Box::new(OperatorNeighbourhood::<SwapStarOperator>::default()),
        Box::new(OperatorNeighbourhood::<RouteSplitOperator>::default()),
    ]
}
