use alloc::vec::Vec;

use hashbrown::HashMap;
use spin::{Mutex, MutexGuard};

use kernel_api::{OsError, OsResult};

use crate::process::{Id, Process, State};
use crate::vm::PhysicalMemory;

/// The process table for the entire machine.
///
/// Holding the guard returned by `lock` keeps every process in the table
/// from being scheduled, created, destroyed or having its address space
/// changed.
pub struct ProcessTable(Mutex<Table>);

impl ProcessTable {
    pub fn new(capacity: usize) -> ProcessTable {
        ProcessTable(Mutex::new(Table {
            processes: HashMap::new(),
            last_id: 0,
            capacity,
        }))
    }

    pub fn lock(&self) -> MutexGuard<'_, Table> {
        self.0.lock()
    }

    /// Returns `true` while some caller holds the table lock.
    pub fn is_locked(&self) -> bool {
        self.0.try_lock().is_none()
    }

    /// Enter a critical region and execute the provided closure with the
    /// table.
    pub fn critical<F, R>(&self, f: F) -> R
        where
            F: FnOnce(&mut Table) -> R,
    {
        let mut guard = self.0.lock();
        f(&mut guard)
    }
}

pub struct Table {
    processes: HashMap<Id, Process>,
    last_id: Id,
    capacity: usize,
}

impl Table {
    fn next_id(&mut self) -> Option<Id> {
        let next = self.last_id.checked_add(1)?;
        self.last_id = next;
        Some(next)
    }

    /// Adds a process and returns its newly allocated ID. Fails with
    /// `NoSpace` if the table is full.
    pub fn add(&mut self, mut process: Process) -> OsResult<Id> {
        if self.is_full() {
            return Err(OsError::NoSpace);
        }
        let id = self.next_id().ok_or(OsError::NoSpace)?;
        process.pid = id;
        self.processes.insert(id, process);
        Ok(id)
    }

    pub fn get(&self, id: Id) -> Option<&Process> {
        self.processes.get(&id)
    }

    pub fn get_mut(&mut self, id: Id) -> Option<&mut Process> {
        self.processes.get_mut(&id)
    }

    pub fn remove(&mut self, id: Id) -> Option<Process> {
        self.processes.remove(&id)
    }

    pub fn is_full(&self) -> bool {
        self.processes.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    /// Live process IDs in ascending order.
    pub fn ids(&self) -> Vec<Id> {
        let mut ids: Vec<Id> = self.processes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Marks a process to be killed. A waiting process is made ready so it
    /// can observe the flag.
    pub fn kill(&mut self, id: Id) -> OsResult<()> {
        let process = self.processes.get_mut(&id).ok_or(OsError::InvalidProcess)?;
        process.killed = true;
        if process.state == State::Waiting {
            process.state = State::Ready;
        }
        Ok(())
    }

    /// Removes a process from the table and frees its address space.
    pub fn reap(&mut self, id: Id, memory: &mut PhysicalMemory) -> OsResult<()> {
        let mut process = self.processes.remove(&id).ok_or(OsError::InvalidProcess)?;
        process.release_memory(memory);
        process.state = State::Zombie;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    #[test]
    fn ids_are_never_reused() {
        let table = ProcessTable::new(2);
        let mut memory = PhysicalMemory::new(1);
        table.critical(|t| {
            let a = t.add(Process::new(String::from("a"))).unwrap();
            let b = t.add(Process::new(String::from("b"))).unwrap();
            assert_eq!((a, b), (1, 2));
            assert_eq!(t.add(Process::new(String::from("c"))), Err(OsError::NoSpace));

            t.reap(a, &mut memory).unwrap();
            let c = t.add(Process::new(String::from("c"))).unwrap();
            assert_eq!(c, 3);
            assert_eq!(t.ids(), vec![2, 3]);
        });
    }

    #[test]
    fn lock_state_is_observable() {
        let table = ProcessTable::new(1);
        assert!(!table.is_locked());
        let guard = table.lock();
        assert!(table.is_locked());
        drop(guard);
        assert!(!table.is_locked());
    }

    #[test]
    fn kill_wakes_waiting_processes() {
        let table = ProcessTable::new(1);
        let mut t = table.lock();
        let mut p = Process::new(String::from("sleeper"));
        p.state = State::Waiting;
        let id = t.add(p).unwrap();
        t.kill(id).unwrap();
        let p = t.get(id).unwrap();
        assert!(p.killed);
        assert_eq!(p.state, State::Ready);
        assert!(!p.is_ready());
        assert_eq!(t.kill(99), Err(OsError::InvalidProcess));
    }
}
