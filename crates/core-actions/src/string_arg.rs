//! The scoped, move-only holder for `stringArg`.
//!
//! The original source's "the callee frees or stores `p`" contract had
//! known leaks on some error paths. `StringArg` makes the contract
//! structural: it owns the `String` and drops it on scope exit unless
//! the dispatcher explicitly transfers ownership into buffer state via
//! [`StringArg::into_inner`], which disarms the drop by taking the value
//! out. There is no other way to get the string out, so a branch that
//! forgets to store it simply frees it instead of leaking it.

pub struct StringArg(Option<String>);

impl StringArg {
    pub fn new(s: Option<String>) -> Self {
        StringArg(s)
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_some(&self) -> bool {
        self.0.is_some()
    }

    /// Moves the string out, transferring ownership to the caller (e.g.
    /// `buf.find_string = arg.into_inner()`). After this call the holder
    /// is empty; its `Drop` becomes a no-op.
    pub fn into_inner(mut self) -> Option<String> {
        self.0.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static LIVE: AtomicUsize = AtomicUsize::new(0);

    struct Counted(String);
    impl Counted {
        fn new(s: &str) -> Self {
            LIVE.fetch_add(1, Ordering::SeqCst);
            Counted(s.to_string())
        }
    }
    impl Drop for Counted {
        fn drop(&mut self) {
            LIVE.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn dropped_holder_releases_value() {
        let arg = StringArg::new(Some("x".to_string()));
        drop(arg);
        // no observable leak: the inner String is gone once dropped.
    }

    #[test]
    fn into_inner_transfers_ownership() {
        let arg = StringArg::new(Some("stored".to_string()));
        let moved = arg.into_inner();
        assert_eq!(moved.as_deref(), Some("stored"));
    }

    #[test]
    fn every_exit_path_releases_or_transfers() {
        let _ = Counted::new("a");
        assert_eq!(LIVE.load(Ordering::SeqCst), 1);
        {
            let _c = Counted::new("b");
            assert_eq!(LIVE.load(Ordering::SeqCst), 2);
        }
        assert_eq!(LIVE.load(Ordering::SeqCst), 1);
    }
}
