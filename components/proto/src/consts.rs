/// Default amount of routes returned for a single route query.
pub const DEFAULT_MAX_ROUTES: usize = 1;

/// Upper bound for the amount of routes returned for a single route query.
pub const MAX_ROUTES: usize = 16;

/// Maximum amount of parked events kept for a single channel whose `Opened` event was not seen
/// yet.
pub const MAX_PENDING_EVENTS_PER_CHANNEL: usize = 16;

/// Maximum amount of channels with parked events.
pub const MAX_PENDING_CHANNELS: usize = 0x400;
