//! A test-runner for flushing out data-races and race-conditions.

use std::{
    hint, mem, panic,
    sync::{Arc, atomic::{AtomicBool, AtomicUsize, Ordering}},
    thread::{self, JoinHandle},
};

/// Bursty runs user-specified steps _in lockstep_ across multiple threads.
///
/// Each thread owns a Local state, and all threads share a Global state. Every step starts on all threads as
/// simultaneously as possible, and no thread starts a step before all threads completed the previous one, thereby
/// maximizing contention on the Global state.
///
/// Constructing a `Bursty` is done through a `BurstyBuilder`.
pub struct Bursty<Global, Local> {
    global: Arc<Global>,
    threads: Vec<JoinHandle<Local>>,
}

impl<Global, Local> Bursty<Global, Local> {
    /// Returns a reference to the Global state.
    ///
    /// #   Warning
    ///
    /// The threads may still be running.
    pub fn global(&self) -> &Global { &self.global }

    /// Joins the threads, and returns the Global state and the Local states, in the order they were provided.
    ///
    /// #   Panics
    ///
    /// If any of the threads panicked.
    pub fn join(mut self) -> (Global, Vec<Local>) {
        let locals = Self::join_all(mem::take(&mut self.threads));

        let global = self.global.clone();
        drop(self);

        match Arc::try_unwrap(global) {
            Ok(global) => (global, locals),
            Err(_) => panic!("Global state still shared after joining all threads"),
        }
    }

    //  Internal.
    fn join_all(threads: Vec<JoinHandle<Local>>) -> Vec<Local> {
        threads.into_iter()
            .map(|handle| handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
            .collect()
    }
}

impl<Global, Local> Drop for Bursty<Global, Local> {
    fn drop(&mut self) {
        let threads = mem::take(&mut self.threads);

        if thread::panicking() {
            for handle in threads {
                let _ = handle.join();
            }
        } else {
            Self::join_all(threads);
        }
    }
}

/// BurstyBuilder, a builder for a `Bursty` instance.
///
/// #   Example
///
/// ```
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use mutate_test::BurstyBuilder;
///
/// let mut builder = BurstyBuilder::new(AtomicI32::new(0), vec!(1, 10));
///
/// builder.add_step(|global: &AtomicI32, local: &mut i32| { global.fetch_add(*local, Ordering::Relaxed); });
///
/// let (global, locals) = builder.launch(4).join();
///
/// assert_eq!(44, global.load(Ordering::Relaxed));
/// assert_eq!(vec!(1, 10), locals);
/// ```
pub struct BurstyBuilder<Global, Local> {
    global: Global,
    locals: Vec<Local>,
    steps: Vec<Arc<dyn Fn(&Global, &mut Local) + Send + Sync + 'static>>,
}

impl<Global, Local> BurstyBuilder<Global, Local>
    where
        Global: Send + Sync + 'static,
        Local: Send + 'static,
{
    /// Creates an instance, which will run one thread per Local state.
    pub fn new(global: Global, locals: Vec<Local>) -> Self {
        Self { global, locals, steps: vec!() }
    }

    /// Adds a step, run on each thread.
    pub fn add_step<Step>(&mut self, step: Step)
        where
            Step: Fn(&Global, &mut Local) + Send + Sync + 'static,
    {
        self.steps.push(Arc::new(step));
    }

    /// Launches the threads, each running the serie of steps `iterations` times.
    ///
    /// #   Panics
    ///
    /// If there is no Local state, or no step.
    pub fn launch(self, iterations: usize) -> Bursty<Global, Local> {
        let Self { global, locals, steps } = self;

        assert!(!locals.is_empty(), "Cannot launch a burst test without a single thread");
        assert!(!steps.is_empty(), "Cannot launch a burst test without a single step");

        let global = Arc::new(global);
        let rendez_vous = Arc::new(RendezVous::new(locals.len()));

        let threads = locals.into_iter().map(|mut local| {
            let global = global.clone();
            let rendez_vous = rendez_vous.clone();
            let steps = steps.clone();

            thread::spawn(move || {
                let guard = PoisonGuard(&*rendez_vous);

                for _ in 0..iterations {
                    for step in &steps {
                        rendez_vous.wait();

                        (**step)(&*global, &mut local);
                    }
                }

                guard.dismiss();

                local
            })
        }).collect();

        Bursty { global, threads }
    }
}

//
//  Implementation details
//

//  Poisons the RendezVous if the thread panics, so that the other threads do not wait forever.
struct PoisonGuard<'a>(&'a RendezVous);

impl<'a> PoisonGuard<'a> {
    fn dismiss(self) { mem::forget(self) }
}

impl<'a> Drop for PoisonGuard<'a> {
    fn drop(&mut self) { self.0.poison(); }
}

//  A spinning barrier, re-usable across generations.
struct RendezVous {
    threads: usize,
    arrived: AtomicUsize,
    generation: AtomicUsize,
    poisoned: AtomicBool,
}

impl RendezVous {
    fn new(threads: usize) -> Self {
        Self {
            threads,
            arrived: AtomicUsize::new(0),
            generation: AtomicUsize::new(0),
            poisoned: AtomicBool::new(false),
        }
    }

    fn poison(&self) { self.poisoned.store(true, Ordering::Relaxed); }

    //  Waits until all threads have arrived.
    fn wait(&self) {
        let generation = self.generation.load(Ordering::Acquire);

        if self.arrived.fetch_add(1, Ordering::AcqRel) + 1 == self.threads {
            //  The last thread to arrive resets the count for the next generation, then releases the others.
            self.arrived.store(0, Ordering::Relaxed);
            self.generation.fetch_add(1, Ordering::Release);
            return;
        }

        while self.generation.load(Ordering::Acquire) == generation {
            if self.poisoned.load(Ordering::Relaxed) {
                abandon_ship();
            }

            hint::spin_loop();
        }
    }
}

#[cold]
#[inline(never)]
fn abandon_ship() -> ! {
    panic!("Someone poisoned the well!");
}

// mod tests
