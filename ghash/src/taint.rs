//! Scoped marking of secret-dependent working memory.
//!
//! The constant-time fallback multiplier brackets its working state with
//! a [`scope`] guard so external checkers (valgrind-style taint tracking,
//! timing instrumentation) can be attached in test builds. In production
//! builds the guard compiles to nothing. The guard unmarks on drop, so
//! the region is released on every exit path.

#[cfg(test)]
extern crate std;

#[cfg(test)]
std::thread_local! {
    static ACTIVE: core::cell::Cell<usize> = const { core::cell::Cell::new(0) };
}

/// Number of taint scopes currently open on this thread. Test
/// instrumentation only.
#[cfg(test)]
pub(crate) fn active_scopes() -> usize {
    ACTIVE.with(|n| n.get())
}

/// Mark the current computation's working memory as secret-derived until
/// the returned guard is dropped.
#[inline(always)]
pub(crate) fn scope() -> Scope {
    #[cfg(test)]
    ACTIVE.with(|n| n.set(n.get() + 1));

    Scope
}

/// Guard returned by [`scope`]; unmarks the region when dropped.
pub(crate) struct Scope;

impl Drop for Scope {
    #[inline(always)]
    fn drop(&mut self) {
        #[cfg(test)]
        ACTIVE.with(|n| n.set(n.get() - 1));
    }
}
