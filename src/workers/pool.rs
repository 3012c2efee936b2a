//! # Pool de Workers
//! src/workers/pool.rs
//!
//! N threads de larga vida, cada uno dueño exclusivo de un [`Handler`].
//! Los trabajos entran por una cola FIFO compartida protegida por un único
//! mutex y dos condvars:
//!
//! - `work_available`: despierta a un worker ocioso cuando llega trabajo
//! - `all_done`: despierta a quien espera en [`WorkerPool::drain_and_stop`]
//!
//! ```text
//! accept loop ──submit──▶ [ cola FIFO ] ──▶ worker-0 (handler 0)
//!                                       ──▶ worker-1 (handler 1)
//!                                       ──▶ ...
//! ```
//!
//! Cada handler se ejecuta de a un trabajo por vez: su thread lo posee
//! durante toda su vida y procesa los trabajos en serie.
//!
//! ## Teardown
//!
//! Soltar el pool sin `drain_and_stop` no espera nada: los trabajos
//! encolados se descartan y los threads quedan detached. Un worker que está
//! en medio de un trabajo lo termina y luego sale.

use crate::error::PoolError;
use std::collections::VecDeque;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Objeto reutilizable ligado a un worker
///
/// El pool crea una instancia por worker y le entrega cada trabajo
/// desencolado por ese worker.
pub trait Handler: Send + 'static {
    /// Datos necesarios para una invocación (ej: un socket aceptado)
    type Task: Send + 'static;

    fn handle(&mut self, task: Self::Task);
}

/// Cola protegida por el mutex
struct Queue<T> {
    tasks: VecDeque<T>,
    closed: bool,
}

/// Estado compartido entre el pool y sus workers
struct Shared<T> {
    queue: Mutex<Queue<T>>,
    work_available: Condvar,
    all_done: Condvar,

    /// Trabajos encolados + trabajos en ejecución
    outstanding: AtomicUsize,

    /// Máximo de trabajos en cola (None = sin límite)
    capacity: Option<usize>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Queue<T>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marca un trabajo como terminado
    fn finish_one(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            // Notificar con el lock tomado para no perder el wakeup
            let _queue = self.lock();
            self.all_done.notify_all();
        }
    }
}

/// Pool de tamaño fijo con un handler por worker
pub struct WorkerPool<H: Handler> {
    shared: Arc<Shared<H::Task>>,
    threads: Vec<JoinHandle<()>>,
}

impl<H: Handler> WorkerPool<H> {
    /// Crea un pool con `workers` threads y cola sin límite
    ///
    /// `factory` recibe el índice del worker y construye su handler.
    pub fn new<F>(workers: usize, factory: F) -> io::Result<Self>
    where
        F: FnMut(usize) -> H,
    {
        Self::build(workers, None, factory)
    }

    /// Crea un pool cuya cola admite a lo sumo `capacity` trabajos pendientes
    pub fn with_capacity<F>(workers: usize, capacity: usize, factory: F) -> io::Result<Self>
    where
        F: FnMut(usize) -> H,
    {
        Self::build(workers, Some(capacity), factory)
    }

    fn build<F>(workers: usize, capacity: Option<usize>, mut factory: F) -> io::Result<Self>
    where
        F: FnMut(usize) -> H,
    {
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                tasks: VecDeque::new(),
                closed: false,
            }),
            work_available: Condvar::new(),
            all_done: Condvar::new(),
            outstanding: AtomicUsize::new(0),
            capacity,
        });

        let mut threads = Vec::with_capacity(workers);
        for id in 0..workers {
            let handler = factory(id);
            let worker_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || worker_loop(id, handler, worker_shared));

            match spawned {
                Ok(handle) => threads.push(handle),
                Err(e) => {
                    // Liberar los workers ya creados antes de fallar
                    let mut pool = Self { shared, threads };
                    pool.close_and_discard();
                    return Err(e);
                }
            }
        }

        debug!(workers, ?capacity, "worker pool started");
        Ok(Self { shared, threads })
    }

    /// Encola un trabajo. Solo bloquea mientras toma el lock de la cola.
    ///
    /// # Errores
    ///
    /// - `PoolClosed` si el pool se está apagando
    /// - `QueueFull` si la cola alcanzó su capacidad
    pub fn submit(&self, task: H::Task) -> Result<(), PoolError> {
        self.try_submit(task).map_err(|(e, _)| e)
    }

    /// Igual que [`submit`](Self::submit), pero un trabajo rechazado vuelve
    /// al llamador junto con el error
    pub fn try_submit(&self, task: H::Task) -> Result<(), (PoolError, H::Task)> {
        let mut queue = self.shared.lock();

        if queue.closed {
            return Err((PoolError::PoolClosed, task));
        }
        if let Some(capacity) = self.shared.capacity {
            if queue.tasks.len() >= capacity {
                return Err((PoolError::QueueFull { capacity }, task));
            }
        }

        queue.tasks.push_back(task);
        self.shared.outstanding.fetch_add(1, Ordering::AcqRel);
        self.shared.work_available.notify_one();
        Ok(())
    }

    /// Espera a que la cola quede vacía y no haya trabajos en curso,
    /// luego deja de aceptar trabajo y une los threads.
    pub fn drain_and_stop(&mut self) {
        {
            let mut queue = self.shared.lock();
            while self.shared.outstanding.load(Ordering::Acquire) != 0 {
                queue = self
                    .shared
                    .all_done
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            queue.closed = true;
        }
        self.shared.work_available.notify_all();

        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                error!("worker thread terminated abnormally");
            }
        }
        debug!("worker pool drained");
    }

    /// Número de workers vivos
    pub fn workers(&self) -> usize {
        self.threads.len()
    }

    /// Trabajos esperando en la cola
    pub fn queued(&self) -> usize {
        self.shared.lock().tasks.len()
    }

    /// Trabajos encolados más los que están en ejecución
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::Acquire)
    }

    /// Cierra la cola y descarta lo pendiente sin esperar
    fn close_and_discard(&mut self) {
        let discarded = {
            let mut queue = self.shared.lock();
            queue.closed = true;
            let pending: Vec<H::Task> = queue.tasks.drain(..).collect();
            self.shared.outstanding.fetch_sub(pending.len(), Ordering::AcqRel);
            pending
        };
        self.shared.work_available.notify_all();
        self.shared.all_done.notify_all();

        if !discarded.is_empty() {
            debug!(count = discarded.len(), "discarding queued tasks");
        }
        // Los JoinHandle se sueltan: los threads quedan detached
        self.threads.clear();
    }
}

impl<H: Handler> Drop for WorkerPool<H> {
    fn drop(&mut self) {
        if !self.threads.is_empty() {
            self.close_and_discard();
        }
    }
}

fn worker_loop<H: Handler>(id: usize, mut handler: H, shared: Arc<Shared<H::Task>>) {
    debug!(worker = id, "worker started");

    loop {
        let task = {
            let mut queue = shared.lock();
            loop {
                if let Some(task) = queue.tasks.pop_front() {
                    break task;
                }
                if queue.closed {
                    debug!(worker = id, "worker stopping");
                    return;
                }
                queue = shared
                    .work_available
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        if panic::catch_unwind(AssertUnwindSafe(|| handler.handle(task))).is_err() {
            error!(worker = id, "handler panicked, task abandoned");
        }
        shared.finish_one();
    }
}
