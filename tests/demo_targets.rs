//! The demos only touch what they are asked to when pointed at a controller.

#[allow(dead_code)]
#[path = "../demos/select_program.rs"]
mod select_program;

#[allow(dead_code)]
#[path = "../demos/write_pmc.rs"]
mod write_pmc;

use focas_client::{
    AddressRange, DataType, ErrorKind, Function, PmcArea, Session, SessionConfig,
    SimulatedController,
};

fn open(sim: &SimulatedController) -> Session<SimulatedController> {
    Session::with_transport(sim.clone(), SessionConfig::new("sim")).unwrap()
}

#[test]
fn write_touches_only_the_requested_byte() {
    let sim = SimulatedController::new();
    sim.set_bytes(PmcArea::Y, 9, &[0xAA, 0x00, 0xBB]);
    let session = open(&sim);

    let target = write_pmc::parse_byte_address("Y10").unwrap();
    write_pmc::write_and_verify(&session, target, 0x42).unwrap();

    assert_eq!(sim.bytes(PmcArea::Y, 9, 3), vec![0xAA, 0x42, 0xBB]);
    assert_eq!(sim.call_count(Function::WritePmcRange), 1);
    assert_eq!(sim.bytes(PmcArea::G, 0, 4), vec![0; 4]);
}

#[test]
fn write_address_argument() {
    assert_eq!(
        write_pmc::parse_byte_address("r250").unwrap(),
        AddressRange::single(PmcArea::R, DataType::Byte, 250)
    );
    for bad in ["", "Y", "Y1.2", "Q10", "Y70000"] {
        let err = write_pmc::parse_byte_address(bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAddress, "{bad}");
    }
}

#[test]
fn select_never_changes_mode_or_starts_a_cycle() {
    let sim = SimulatedController::new();
    sim.add_program("//CNC_MEM/USER/PATH1/O2000");
    let session = open(&sim);

    select_program::select_and_verify(&session, "//CNC_MEM/USER/PATH1/O2000").unwrap();
    select_program::select_and_verify(&session, "//CNC_MEM/USER/PATH1/O9999").unwrap();

    assert_eq!(sim.main_program(), "//CNC_MEM/USER/PATH1/O2000");
    assert_eq!(sim.call_count(Function::WriteOperationMode), 0);
    assert_eq!(sim.call_count(Function::WriteMdiProgram), 0);
    assert_eq!(sim.call_count(Function::CycleStart), 0);
    assert_eq!(sim.cycle_starts(), 0);
}
