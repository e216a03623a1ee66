bitflags::bitflags! {
	/// Optional callbacks a decorator implements.
	///
	/// Declared by the decorator and fixed at bind time. The engine only routes
	/// calls the decorator declared.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct Capabilities: u32 {
		/// Decorates posted records.
		const DECORATES = 0x1;
		/// Observes removals by key.
		const OBSERVES_REMOVAL_BY_KEY = 0x2;
		/// Observes removals with the removed record.
		const OBSERVES_REMOVAL_WITH_PAYLOAD = 0x4;
	}
}
