//! Per-state metrics, named to match the original dotted hierarchy so existing dashboards
//! keep resolving.

use std::time::Duration;

use consensus_metrics::{Gauge, Histogram, MetricsFactory, Rate};

/// Thirty days: the original's max-latency bound for every block-sync state histogram.
const MAX_STATE_LATENCY: Duration = Duration::from_secs(24 * 30 * 3600);

pub struct IdleMetrics {
    pub state_latency: Histogram,
    pub times_reset: Gauge,
    pub times_expired: Gauge,
}

pub struct CollectingMetrics {
    pub state_latency: Histogram,
    pub times_successful: Gauge,
}

pub struct FinishedCarMetrics {
    pub state_latency: Histogram,
    pub times_no_responses: Gauge,
    pub times_with_responses: Gauge,
}

pub struct WaitingMetrics {
    pub state_latency: Histogram,
    pub times_timeout: Gauge,
    pub times_successful: Gauge,
    pub times_byzantine: Gauge,
}

pub struct ProcessingMetrics {
    pub state_latency: Histogram,
    pub blocks_rate: Rate,
    pub committed_blocks: Gauge,
    pub failed_commit_blocks: Gauge,
    pub failed_validation_blocks: Gauge,
}

/// Counters for the source/responder role (§4.3): answering another node's availability
/// and chunk requests out of local storage. Kept separate from the petitioner-side state
/// metrics above since a node runs both roles concurrently, off the same storage.
pub struct SourceMetrics {
    pub availability_requests_answered: Gauge,
    pub availability_requests_ignored: Gauge,
    pub sync_requests_answered: Gauge,
    pub sync_requests_ignored: Gauge,
}

pub struct StateMetrics {
    pub idle: IdleMetrics,
    pub collecting: CollectingMetrics,
    pub finished_car: FinishedCarMetrics,
    pub waiting: WaitingMetrics,
    pub processing: ProcessingMetrics,
    pub source: SourceMetrics,
}

impl StateMetrics {
    pub fn new(factory: &MetricsFactory) -> Self {
        Self {
            idle: IdleMetrics {
                state_latency: factory.histogram("BlockSync.Idle.StateLatency", MAX_STATE_LATENCY),
                times_reset: factory.gauge("BlockSync.Idle.TimesReset"),
                times_expired: factory.gauge("BlockSync.Idle.TimesExpired"),
            },
            collecting: CollectingMetrics {
                state_latency: factory
                    .histogram("BlockSync.Collecting.StateLatency", MAX_STATE_LATENCY),
                times_successful: factory.gauge("BlockSync.Collecting.SuccessCount"),
            },
            finished_car: FinishedCarMetrics {
                state_latency: factory
                    .histogram("BlockSync.FinishedCollecting.StateLatency", MAX_STATE_LATENCY),
                times_no_responses: factory.gauge("BlockSync.FinishedCollecting.NoResponsesCount"),
                times_with_responses: factory
                    .gauge("BlockSync.FinishedCollecting.WithResponsesCount"),
            },
            waiting: WaitingMetrics {
                state_latency: factory.histogram("BlockSync.Waiting.StateLatency", MAX_STATE_LATENCY),
                times_timeout: factory.gauge("BlockSync.Waiting.TimeoutCount"),
                times_successful: factory.gauge("BlockSync.Waiting.SuccessResponseCount"),
                times_byzantine: factory.gauge("BlockSync.Waiting.ByzantineResponseCount"),
            },
            processing: ProcessingMetrics {
                state_latency: factory
                    .histogram("BlockSync.Processing.StateLatency", MAX_STATE_LATENCY),
                blocks_rate: factory.rate("BlockSync.Processing.BlocksRate"),
                committed_blocks: factory.gauge("BlockSync.Processing.CommittedBlocks"),
                failed_commit_blocks: factory.gauge("BlockSync.Processing.FailedToCommitBlocks"),
                failed_validation_blocks: factory
                    .gauge("BlockSync.Processing.FailedToValidateBlocks"),
            },
            source: SourceMetrics {
                availability_requests_answered: factory
                    .gauge("BlockSync.Source.AvailabilityRequestsAnswered"),
                availability_requests_ignored: factory
                    .gauge("BlockSync.Source.AvailabilityRequestsIgnored"),
                sync_requests_answered: factory.gauge("BlockSync.Source.SyncRequestsAnswered"),
                sync_requests_ignored: factory.gauge("BlockSync.Source.SyncRequestsIgnored"),
            },
        }
    }
}
