extern crate kernel;
extern crate snapshot_core;

use std::env;
use std::process;

use pretty_hex::PrettyHex;

use kernel::checkpoint::{read_snapshot, CheckpointError};
use snapshot_core::{ArtifactNames, ProcessSnapshot};

use crate::host::HostFileSystem;

mod host;

fn load(args: &[String]) -> Result<ProcessSnapshot, CheckpointError> {
    let names = match args.get(1) {
        Some(prefix) => ArtifactNames::with_prefix(prefix),
        None => ArtifactNames::default(),
    };
    read_snapshot(&HostFileSystem::new(&args[0]), &names)
}

fn inspect(args: &[String]) -> Result<(), CheckpointError> {
    if args.is_empty() {
        println!("usage: inspect <dir> [prefix]");
        return Ok(());
    }
    let snapshot = load(args)?;

    println!("manifest:   {:?}", snapshot.manifest);
    println!("descriptor: {:?}", snapshot.descriptor);
    println!("context:    lr={:#x} sp={:#x} x19..x29={:x?}",
             snapshot.context.lr, snapshot.context.sp, snapshot.context.regs);
    println!("trap frame: pc={:#x} sp={:#x} spsr={:#x} tpidr={:#x}",
             snapshot.trapframe.pc(), snapshot.trapframe.stack_pointer(),
             snapshot.trapframe.spsr, snapshot.trapframe.tpidr);
    println!("pages:      {} ({} user)", snapshot.page_count(), snapshot.user_pages());

    for (i, (page, flags)) in snapshot.pages.iter().zip(snapshot.flags.iter()).enumerate() {
        println!("  {:4} {:#010x} {:?} {}..", i, i * snapshot_core::PAGE_SIZE, flags, hex::encode(&page[..16]));
    }
    Ok(())
}

fn verify(args: &[String]) -> Result<(), CheckpointError> {
    if args.is_empty() {
        println!("usage: verify <dir> [prefix]");
        return Ok(());
    }
    let snapshot = load(args)?;

    let counts = snapshot.record_counts();
    if !counts.is_consistent() {
        return Err(CheckpointError::RecordCountMismatch {
            pages: counts.pages,
            flags: counts.flags,
            expected: counts.expected,
        });
    }
    if snapshot.manifest.user_pages as usize != snapshot.user_pages() {
        println!("warning: manifest counts {} user pages, flag stream has {}",
                 snapshot.manifest.user_pages, snapshot.user_pages());
    }

    println!("ok: pid {} '{}', {} pages", snapshot.descriptor.pid, snapshot.descriptor.name(), counts.pages);
    Ok(())
}

fn dump(args: &[String]) -> Result<(), CheckpointError> {
    if args.len() < 2 {
        println!("usage: dump <dir> <page> [prefix]");
        return Ok(());
    }
    let index: usize = match args[1].parse() {
        Ok(index) => index,
        Err(_) => {
            println!("invalid page index: {}", args[1]);
            return Ok(());
        }
    };

    let mut rest = vec![args[0].clone()];
    rest.extend(args.iter().skip(2).cloned());
    let snapshot = load(&rest)?;

    match (snapshot.pages.get(index), snapshot.flags.get(index)) {
        (Some(page), Some(flags)) => {
            println!("page {} {:?}", index, flags);
            println!("{:?}", (&page[..]).hex_dump());
        }
        _ => println!("no page {} (snapshot has {})", index, snapshot.page_count()),
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("requires a command: inspect, verify, dump");
        return;
    }

    let result = match args[1].as_str() {
        "inspect" => inspect(&args[2..]),
        "verify" => verify(&args[2..]),
        "dump" => dump(&args[2..]),
        other => {
            println!("unknown command: {}", other);
            process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
