use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::{Context, Wake, Waker};

use super::task::{BoxedTaskFuture, Task, TaskId};

// Polls spawned tasks to advance their state.
//
// Wake-up notifications push the task id onto the shared ready queue,
// which is drained by the simulation run loop between event deliveries.
pub(crate) struct Executor {
    tasks: HashMap<TaskId, Task>,
    ready: Arc<ReadyQueue>,
    task_count: u64,
}

impl Executor {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            ready: Arc::new(ReadyQueue::new()),
            task_count: 0,
        }
    }

    // Admits a new task and schedules its first poll.
    pub fn add_task(&mut self, future: BoxedTaskFuture) {
        let task_id = self.task_count;
        self.task_count += 1;
        self.tasks.insert(task_id, Task::new(future));
        self.ready.push(task_id);
    }

    // Polls the next ready task, if any.
    // Returns true if some task was polled and false otherwise.
    pub fn poll_next(&mut self) -> bool {
        while let Some(task_id) = self.ready.pop() {
            let mut task = match self.tasks.remove(&task_id) {
                Some(task) => task,
                // stale wake-up for a completed task
                None => continue,
            };
            let waker = Waker::from(Arc::new(TaskWaker {
                task_id,
                ready: self.ready.clone(),
            }));
            let mut async_ctx = Context::from_waker(&waker);
            if task.poll(&mut async_ctx).is_pending() {
                self.tasks.insert(task_id, task);
            }
            return true;
        }
        false
    }

    // Number of admitted tasks which have not yet completed.
    pub fn pending_task_count(&self) -> usize {
        self.tasks.len()
    }
}

struct ReadyQueue {
    queue: Mutex<VecDeque<TaskId>>,
}

impl ReadyQueue {
    fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    fn push(&self, task_id: TaskId) {
        self.queue.lock().unwrap().push_back(task_id);
    }

    fn pop(&self) -> Option<TaskId> {
        self.queue.lock().unwrap().pop_front()
    }
}

// Waker routing wake-ups to the ready queue.
// The simulation is single-threaded, the Send + Sync bounds come from std::task::Wake.
struct TaskWaker {
    task_id: TaskId,
    ready: Arc<ReadyQueue>,
}

impl Wake for TaskWaker {
    fn wake(self: Arc<Self>) {
        self.ready.push(self.task_id);
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.ready.push(self.task_id);
    }
}
