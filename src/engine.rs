//! Pluggable engines and the process-wide registry they are looked up in.
//!
//! An [`Engine`] supplies alternative implementations (typically hardware
//! backed) and can load private keys by identifier. Engines are registered
//! once, by id, and borrowed through an [`EnginePointer`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Once, OnceLock, PoisonError, RwLock};

use der::flagset::{FlagSet, flags};

use crate::error::Reason;
use crate::error_stack::{
    ClearErrorOnReturn, CryptoErrorList, MarkPopErrorOnReturn, put_error, put_error_with_data,
};
use crate::handle::{Handle, Resource};
use crate::key::{Key, KeyPointer};

flags! {
    /// Operation families an engine can be made the default for.
    pub enum EngineMethod: u32 {
        Rsa = 0x0001,
        Dsa = 0x0002,
        Dh = 0x0004,
        Rand = 0x0008,
        Ciphers = 0x0040,
        Digests = 0x0080,
        PkeyMeths = 0x0200,
        PkeyAsn1Meths = 0x0400,
        Ec = 0x0800,
    }
}

pub type EngineMethods = FlagSet<EngineMethod>;

/// An externally provided implementation of toolkit operations.
pub trait Engine: Send + Sync {
    /// The id the engine is registered and looked up under.
    fn id(&self) -> &str;

    /// Prepares the engine for use. Returns `false` if it cannot be used.
    fn init(&self) -> bool {
        true
    }

    /// Undoes [`Engine::init`].
    fn finish(&self) {}

    /// Makes the engine the default for `methods`.
    fn set_default(&self, methods: EngineMethods) -> bool;

    /// Loads the private key known to the engine as `key_id`.
    fn load_private_key(&self, key_id: &str) -> Option<Key>;
}

type Registry = RwLock<HashMap<String, Arc<dyn Engine>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Default::default)
}

/// Adds `engine` to the registry, replacing any engine with the same id.
pub fn register_engine(engine: Arc<dyn Engine>) {
    let id = engine.id().to_string();
    let replaced = registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(id.clone(), engine)
        .is_some();
    tracing::debug!(engine = %id, replaced, "registered engine");
}

/// Registers `engines` the first time it is called. Later calls do nothing.
pub fn init_engines_once(engines: impl IntoIterator<Item = Arc<dyn Engine>>) {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        for engine in engines {
            register_engine(engine);
        }
    });
}

fn find_engine(name: &str) -> Option<Arc<dyn Engine>> {
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .cloned()
}

/// A reference to a registered engine, plus whether freeing it should
/// finish the engine.
pub struct EngineHandle {
    engine: Arc<dyn Engine>,
    finish_on_exit: bool,
}

impl Resource for EngineHandle {
    const KIND: &'static str = "engine";

    fn free(self) {
        if self.finish_on_exit {
            tracing::trace!(engine = self.engine.id(), "finishing engine");
            self.engine.finish();
        }
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("id", &self.engine.id())
            .field("finish_on_exit", &self.finish_on_exit)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct EnginePointer {
    engine: Handle<EngineHandle>,
}

impl EnginePointer {
    pub fn new(engine: Arc<dyn Engine>, finish_on_exit: bool) -> Self {
        Self {
            engine: Handle::new(EngineHandle {
                engine,
                finish_on_exit,
            }),
        }
    }

    pub fn empty() -> Self {
        Self {
            engine: Handle::empty(),
        }
    }

    /// Looks up a registered engine by id.
    ///
    /// An unknown id yields an empty pointer. The "no such engine" record is
    /// copied into `errors` and then popped from the queue.
    pub fn get_engine_by_name(name: &str, errors: Option<&mut CryptoErrorList>) -> EnginePointer {
        let _guard = MarkPopErrorOnReturn::new(errors);
        match find_engine(name) {
            Some(engine) => {
                tracing::debug!(engine = name, "found engine");
                EnginePointer::new(engine, false)
            }
            None => {
                put_error_with_data(Reason::ENGINE_NO_SUCH_ENGINE, format!("id={name}"));
                EnginePointer::empty()
            }
        }
    }

    pub fn is_null(&self) -> bool {
        self.engine.is_null()
    }

    pub fn get(&self) -> Option<&dyn Engine> {
        self.engine.get().map(|handle| handle.engine.as_ref())
    }

    pub fn finish_on_exit(&self) -> bool {
        self.engine.get().is_some_and(|handle| handle.finish_on_exit)
    }

    pub fn set_finish_on_exit(&mut self) {
        if let Some(handle) = self.engine.get_mut() {
            handle.finish_on_exit = true;
        }
    }

    /// Initializes the engine, optionally arranging for it to be finished
    /// when this pointer lets go of it.
    pub fn init(&mut self, finish_on_exit: bool) -> bool {
        if finish_on_exit {
            self.set_finish_on_exit();
        }
        let Some(handle) = self.engine.get() else {
            return false;
        };
        let ok = handle.engine.init();
        if !ok {
            put_error(Reason::ENGINE_INIT_FAILED);
        }
        ok
    }

    /// Makes the engine the default for `methods`. The queue is cleared on
    /// return; a failure is reported through `errors`.
    pub fn set_as_default(
        &mut self,
        methods: EngineMethods,
        errors: Option<&mut CryptoErrorList>,
    ) -> bool {
        let _guard = ClearErrorOnReturn::new(errors);
        let Some(handle) = self.engine.get() else {
            put_error(Reason::CRYPTO_PASSED_NULL_PARAMETER);
            return false;
        };
        let ok = handle.engine.set_default(methods);
        if !ok {
            put_error(Reason::ENGINE_SET_DEFAULT_FAILED);
        }
        ok
    }

    /// Loads a private key through the engine. Empty on failure.
    pub fn load_private_key(&mut self, key_id: &str) -> KeyPointer {
        let Some(handle) = self.engine.get() else {
            return KeyPointer::empty();
        };
        match handle.engine.load_private_key(key_id) {
            Some(key) => KeyPointer::new(key),
            None => {
                put_error_with_data(Reason::ENGINE_FAILED_LOADING_PRIVATE_KEY, key_id);
                KeyPointer::empty()
            }
        }
    }

    /// Lets go of the current engine, then holds `engine`, if any.
    pub fn reset(&mut self, engine: Option<Arc<dyn Engine>>, finish_on_exit: bool) {
        self.engine.reset(engine.map(|engine| EngineHandle {
            engine,
            finish_on_exit,
        }));
    }

    /// Gives up the engine without finishing it.
    pub fn release(&mut self) -> Option<Arc<dyn Engine>> {
        self.engine.release().map(|handle| handle.engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_stack::{clear_errors, error_depth, peek_error};
    use crate::key::PrivateKey;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingEngine {
        id: &'static str,
        inits: AtomicUsize,
        finishes: AtomicUsize,
    }

    impl Engine for CountingEngine {
        fn id(&self) -> &str {
            self.id
        }

        fn init(&self) -> bool {
            self.inits.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn finish(&self) {
            self.finishes.fetch_add(1, Ordering::SeqCst);
        }

        fn set_default(&self, methods: EngineMethods) -> bool {
            !methods.contains(EngineMethod::Rand)
        }

        fn load_private_key(&self, key_id: &str) -> Option<Key> {
            (key_id == "slot-0").then(|| {
                let secret = p256::SecretKey::from_slice(&[7u8; 32]).unwrap();
                Key::Private(PrivateKey::EcdsaP256(secret))
            })
        }
    }

    fn counting(id: &'static str) -> Arc<CountingEngine> {
        let engine = Arc::new(CountingEngine {
            id,
            ..Default::default()
        });
        register_engine(engine.clone());
        engine
    }

    #[test]
    fn unknown_engine() {
        clear_errors();
        let mut errors = CryptoErrorList::new();
        let ptr = EnginePointer::get_engine_by_name("does-not-exist", Some(&mut errors));
        assert!(ptr.is_null());
        assert_eq!(error_depth(), 0);
        assert_eq!(
            errors.peek_back(),
            Some("error:13000074:engine routines::no such engine:id=does-not-exist")
        );
    }

    #[test]
    fn finish_only_when_requested() {
        let engine = counting("test-finish");
        {
            let ptr = EnginePointer::get_engine_by_name("test-finish", None);
            assert!(!ptr.is_null());
            assert!(!ptr.finish_on_exit());
        }
        assert_eq!(engine.finishes.load(Ordering::SeqCst), 0);

        {
            let mut ptr = EnginePointer::get_engine_by_name("test-finish", None);
            assert!(ptr.init(true));
            assert!(ptr.finish_on_exit());
        }
        assert_eq!(engine.inits.load(Ordering::SeqCst), 1);
        assert_eq!(engine.finishes.load(Ordering::SeqCst), 1);

        let mut ptr = EnginePointer::get_engine_by_name("test-finish", None);
        ptr.set_finish_on_exit();
        assert!(ptr.release().is_some());
        assert!(ptr.is_null());
        drop(ptr);
        assert_eq!(engine.finishes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn set_as_default_clears_queue() {
        counting("test-default");
        clear_errors();
        put_error(Reason::PEM_NO_START_LINE);

        let mut ptr = EnginePointer::get_engine_by_name("test-default", None);
        let mut errors = CryptoErrorList::new();
        assert!(!ptr.set_as_default(EngineMethod::Rand | EngineMethod::Rsa, Some(&mut errors)));
        assert_eq!(peek_error(), None);
        assert_eq!(errors.len(), 2);
        assert!(
            errors
                .peek_back()
                .is_some_and(|m| m.ends_with("engine is not in the list"))
        );

        assert!(ptr.set_as_default(EngineMethod::Digests.into(), None));
    }

    #[test]
    fn load_key() {
        counting("test-keys");
        clear_errors();
        let mut ptr = EnginePointer::get_engine_by_name("test-keys", None);
        let key = ptr.load_private_key("slot-0");
        assert!(key.get().is_some_and(Key::is_private));

        assert!(ptr.load_private_key("slot-9").is_null());
        assert_eq!(
            peek_error(),
            Some(Reason::ENGINE_FAILED_LOADING_PRIVATE_KEY.error_code())
        );
        clear_errors();

        assert!(EnginePointer::empty().load_private_key("slot-0").is_null());
    }
}
