//! Hardware against software on the real accelerator
//!
//! Needs the FPGA image loaded, root for `/dev/mem`, and for the interrupt
//! test the forwarding module. Run with `cargo test -- --ignored`.

use dkstr_driver::{
    select_backend, BackendSelection, BackendType, DriverConfig, PathBackend, SynchronousBackend,
    WaitMode,
};
use dkstr_maps::MapGenerator;

fn hardware(mode: WaitMode) -> (Box<dyn PathBackend>, usize) {
    let mut config = DriverConfig::from_env().expect("DKSTR_* environment");
    config.wait_mode = mode;
    let side = config.fabric_side;
    let backend = select_backend(BackendSelection::Hardware, &config).expect("FPGA backend");
    assert_eq!(backend.backend_type(), BackendType::Hardware);
    (backend, side)
}

fn check_parity(mode: WaitMode) {
    let (mut hw, side) = hardware(mode);
    let mut gen = MapGenerator::new(0x5EED);
    for _ in 0..50 {
        let grid = gen.grid(side, side).unwrap();
        let start = gen.coord(side, side);
        let end = gen.coord(side, side);
        let fpga = hw.find(&grid, start, end).expect("offload");
        let cpu = SynchronousBackend.find(&grid, start, end).unwrap();
        assert_eq!(fpga.route, cpu.route, "{start} -> {end}");
        println!("{start} -> {end}: {}", fpga.cycles.unwrap_or_default());
    }
}

#[test]
#[ignore] // Requires the accelerator
fn polled_hardware_matches_synchronous() {
    check_parity(WaitMode::Poll);
}

#[test]
#[ignore] // Requires the accelerator and interrupt module
fn interrupt_hardware_matches_synchronous() {
    let config = DriverConfig::from_env().unwrap();
    let before = dkstr_driver::hw::read_interrupt_count(&config.interrupt_status).ok();
    check_parity(WaitMode::Interrupt);
    if let Some(before) = before {
        let after = dkstr_driver::hw::read_interrupt_count(&config.interrupt_status).unwrap();
        assert!(after >= before + 50, "interrupt count {before} -> {after}");
    }
}
