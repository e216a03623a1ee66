//! Host feature gates.

/// Platform API level of the host running the engine.
pub type PlatformLevel = u32;

/// Newest platform level this build knows about.
pub const LATEST_PLATFORM_LEVEL: PlatformLevel = 29;

bitflags::bitflags! {
	/// Record features supported by the host.
	///
	/// Setters for fields the host does not support are silent no-ops.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct HostFeatures: u32 {
		/// Notification channels.
		const CHANNELS = 1 << 0;
		/// Self-cancelling timeouts.
		const TIMEOUT = 1 << 1;
		/// Group alert behavior.
		const GROUP_ALERT = 1 << 2;
		/// Structured people list in extras.
		const PEOPLE_LIST = 1 << 3;
		/// Bubbles.
		const BUBBLES = 1 << 4;
		/// Locus ids.
		const LOCUS = 1 << 5;
		/// System generated contextual actions.
		const SYSTEM_ACTIONS = 1 << 6;
	}
}

impl HostFeatures {
	/// Returns the features available at `level`.
	pub fn for_platform_level(level: PlatformLevel) -> Self {
		let mut features = Self::empty();
		if level >= 26 {
			features |= Self::CHANNELS | Self::TIMEOUT | Self::GROUP_ALERT;
		}
		if level >= 28 {
			features |= Self::PEOPLE_LIST;
		}
		if level >= 29 {
			features |= Self::BUBBLES | Self::LOCUS | Self::SYSTEM_ACTIONS;
		}
		features
	}
}
