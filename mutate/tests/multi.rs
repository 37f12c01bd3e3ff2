use std::{collections::BTreeSet, sync::{self, atomic}, thread};

use serial_test::serial;

use mutate::{AtomicCell, Lifo, Scalar};

//
//  Tests
//

#[serial]
#[test]
fn increment_modulo_i32() {
    //  Test that no increment is lost, nor duplicated, when all threads hammer the same cell.
    let counter = increment_modulo(0i32, |value| (value + 1) % MODULO as i32);

    assert_eq!(64, counter);
}

#[serial]
#[test]
fn increment_modulo_u64() {
    let counter = increment_modulo(0u64, |value| (value + 1) % MODULO as u64);

    assert_eq!(64, counter);
}

#[serial]
#[test]
fn increment_modulo_f64() {
    let counter = increment_modulo(0.0f64, |value| if value + 1.0 >= MODULO as f64 { 0.0 } else { value + 1.0 });

    assert_eq!(64.0, counter);
}

#[serial]
#[test]
fn alternate_push_pop() {
    //  Test that two threads can alternately push and pop, with neither losing nor duplicating any value.
    //
    //  Each thread holds one value, which it pushes and then replaces with the value it pops. As every pop is preceded
    //  by a push from the same thread, every pop succeeds, and at the end each thread holds a distinct value.
    static VALUES: [usize; 2] = [0, 1];

    init_tracing();

    let lifo = sync::Arc::new(Lifo::<'static, usize>::new());

    let start = RendezVous::new("start", VALUES.len());

    let pool = Pool::new(VALUES.len(), |i| {
        let lifo = lifo.clone();
        let start = start.clone();

        move || {
            let mut held = &VALUES[i];

            start.wait_until_all_ready();

            for iteration in 0..PUSH_POPS {
                lifo.push(held).expect("Pushed");

                held = lifo.pop()
                    .unwrap_or_else(|| panic!("thread {}, iteration {}: nothing to pop", i, iteration));
            }

            *held
        }
    });

    let held: BTreeSet<_> = pool.join().into_iter().collect();

    assert_eq!(VALUES.len(), held.len(), "{:?}", held);

    let mut lifo = sync::Arc::try_unwrap(lifo).expect("Sole owner");
    let census = lifo.census();

    //  A thread may observe the free list empty while the other is moving a node, hence the slack.
    assert_eq!(0, census.active, "{:?}", census);
    assert!(census.is_conserved(), "{:?}", census);
    assert!(census.allocated <= 2 * VALUES.len(), "{:?}", census);
}

#[serial]
#[test]
fn concurrent_drain_distinct() {
    //  Test that concurrent pops never return the same value twice.
    //
    //  1.  Each thread pushes its own batch of distinct values, concurrently.
    //  2.  Each thread pops until the stack is empty, concurrently.
    //  3.  The values popped across all threads are exactly the values pushed.

    const BATCH: usize = 1_000;

    init_tracing();

    let number_iterations = number_iterations();
    let number_threads = number_threads();

    let values: &'static [usize] = Box::leak((0..number_threads * BATCH).collect::<Vec<_>>().into_boxed_slice());

    for iteration in 0..number_iterations {
        let lifo = sync::Arc::new(Lifo::<'static, usize>::new());

        let push = RendezVous::new("push", number_threads);
        let pop = RendezVous::new("pop", number_threads);

        let pool = Pool::new(number_threads, |i| {
            let lifo = lifo.clone();
            let push = push.clone();
            let pop = pop.clone();

            move || {
                push.wait_until_all_ready();

                for value in &values[i * BATCH..(i + 1) * BATCH] {
                    lifo.push(value).expect("Pushed");
                }

                pop.wait_until_all_ready();

                let mut popped = Vec::with_capacity(BATCH);

                while let Some(value) = lifo.pop() {
                    popped.push(*value);
                }

                popped
            }
        });

        let popped: Vec<_> = pool.join().into_iter().flatten().collect();
        let distinct: BTreeSet<_> = popped.iter().copied().collect();

        assert_eq!(values.len(), popped.len(), "iteration {}", iteration);
        assert_eq!(values.len(), distinct.len(), "iteration {}", iteration);

        let mut lifo = sync::Arc::try_unwrap(lifo).expect("Sole owner");
        let census = lifo.census();

        assert_eq!((0, values.len(), values.len()), (census.active, census.free, census.allocated));
    }
}

//
//  Multi-threaded helpers
//

struct Pool<T>(Vec<thread::JoinHandle<T>>);

impl<T> Pool<T> {
    fn new<F, G>(count: usize, mut factory: F) -> Self
        where
            F: FnMut(usize) -> G,
            G: FnOnce() -> T + Send + 'static,
            T: Send + 'static
    {
        let threads: Vec<_> = (0..count)
            .map(|i| thread::spawn(factory(i)))
            .collect();

        Self(threads)
    }

    fn join(mut self) -> Vec<T> {
        let thread_handles = std::mem::take(&mut self.0);
        Self::join_handles(thread_handles)
    }

    fn join_handles(thread_handles: Vec<thread::JoinHandle<T>>) -> Vec<T> {
        //  First join _all_ threads, then unwrap, so that no thread is left dangling.
        let results: Vec<_> = thread_handles.into_iter()
            .map(|handle| handle.join())
            .collect();

        results.into_iter()
            .map(|value| value.unwrap())
            .collect()
    }
}

impl<T> Drop for Pool<T> {
    fn drop(&mut self) {
        let thread_handles = std::mem::take(&mut self.0);

        if !thread::panicking() {
            Self::join_handles(thread_handles);
        }
    }
}

//  A single-use barrier.
#[derive(Clone, Debug)]
struct RendezVous(&'static str, sync::Arc<atomic::AtomicUsize>);

impl RendezVous {
    fn new(name: &'static str, count: usize) -> Self {
        Self(name, sync::Arc::new(atomic::AtomicUsize::new(count)))
    }

    fn wait_until_all_ready(&self) {
        self.1.fetch_sub(1, atomic::Ordering::AcqRel);

        while !self.is_ready() {
            std::hint::spin_loop();
        }
    }

    fn is_ready(&self) -> bool { self.1.load(atomic::Ordering::Acquire) == 0 }
}

//
//  Implementation Details
//

const MODULO: usize = 128;

const INCREMENTS: usize = 1_000_000;

const PUSH_POPS: usize = 1_000_000;

//  Increments a cell `INCREMENTS` times, spread across all threads, and returns its final value.
fn increment_modulo<T, F>(initial: T, increment: F) -> T
    where
        T: Scalar + Send + 'static,
        F: Fn(T) -> T + Copy + Send + 'static,
{
    init_tracing();

    let number_threads = number_threads();

    let counter: &'static AtomicCell<T> = Box::leak(Box::new(AtomicCell::new(initial)));

    let start = RendezVous::new("start", number_threads);

    let pool = Pool::new(number_threads, |i| {
        let start = start.clone();

        //  The first thread picks up the remainder.
        let share = INCREMENTS / number_threads + if i == 0 { INCREMENTS % number_threads } else { 0 };

        move || {
            start.wait_until_all_ready();

            for _ in 0..share {
                while !counter.mutate(|value| Some(increment(value))) {}
            }
        }
    });

    pool.join();

    counter.get()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn number_iterations() -> usize { read_number_from_environment("MUTATE_MULTI_NUMBER_ITERATIONS", 10) }

fn number_threads() -> usize {
    read_number_from_environment("MUTATE_MULTI_NUMBER_THREADS", num_cpus::get().max(2).min(8))
}

fn read_number_from_environment(name: &str, default: usize) -> usize {
    if let Ok(value) = std::env::var(name) {
        if let Ok(result) = value.parse() {
            println!("read_number_from_environment - {}: {}", name, result);
            return result;
        }
    }

    println!("read_number_from_environment - {}: {} (default)", name, default);
    default
}
