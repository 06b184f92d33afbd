//! End-to-end behaviour of a session against the simulated controller.

use focas_client::{
    codes, AddressRange, BitAddress, DataType, DetailCause, DetailedError, ErrorKind, FocasError,
    Function, MachineStatus, OperationMode, PmcArea, PmcValue, PositionSet, ProgramInfo, Session,
    SessionConfig, SimulatedController, SpindleInfo,
};

fn open(sim: &SimulatedController) -> Session<SimulatedController> {
    Session::open_with(SessionConfig::new("sim"), |config| sim.connect(config)).unwrap()
}

fn sample_value(data_type: DataType, seed: u16) -> PmcValue {
    let seed = i32::from(seed);
    match data_type {
        DataType::Byte => PmcValue::Byte((seed * 37 % 256) as u8),
        DataType::Word => PmcValue::Word((seed * 1_021 - 30_000) as i16),
        DataType::Long => PmcValue::Long(seed * -99_991),
        DataType::Float => PmcValue::Float(seed as f32 * 0.5 - 3.25),
        DataType::Double => PmcValue::Double(f64::from(seed) * -1.125e6),
    }
}

#[test]
fn write_then_read_returns_written_values() {
    let sim = SimulatedController::new();
    let session = open(&sim);

    let bounds = [(0u16, 0u16), (5, 9), (100, 163), (1000, 1299)];
    for area in PmcArea::ALL.into_iter().filter(|a| a.supports_write()) {
        for data_type in DataType::ALL {
            for (start, end) in bounds {
                let range = AddressRange::new(area, data_type, start, end).unwrap();
                let values: Vec<PmcValue> =
                    (start..=end).map(|i| sample_value(data_type, i)).collect();
                session.write_range(range, &values).unwrap();
                assert_eq!(session.read_range(range).unwrap(), values, "{range}");
            }
        }
    }
}

#[test]
fn read_bit_matches_shift_and_mask_for_every_byte() {
    let sim = SimulatedController::new();
    let session = open(&sim);
    for v in 0..=u8::MAX {
        session
            .write_range(AddressRange::single(PmcArea::R, DataType::Byte, 0), &[PmcValue::Byte(v)])
            .unwrap();
        for b in 0..8 {
            let bit = session.read_bit(BitAddress::new(PmcArea::R, 0, b).unwrap()).unwrap();
            assert_eq!(bit, (v >> b) & 1 == 1, "value {v} bit {b}");
        }
    }
}

#[test]
fn invalid_addresses_fail_before_any_call() {
    let err = AddressRange::new(PmcArea::D, DataType::Word, 10, 9).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAddress);

    let err = BitAddress::new(PmcArea::X, 7, 8).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAddress);

    let sim = SimulatedController::new();
    let session = open(&sim);
    let range = AddressRange::new(PmcArea::G, DataType::Word, 0, 3).unwrap();
    let err = session.write_range(range, &[PmcValue::Word(1); 3]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAddress);
    let err = session
        .write_range(range, &[PmcValue::Byte(1); 4])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAddress);
    assert!(sim.calls().is_empty());
}

#[test]
fn refused_connection_yields_no_session() {
    let sim = SimulatedController::new();
    sim.refuse_connections();
    let err = Session::open_with(SessionConfig::new("sim"), |config| sim.connect(config))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(matches!(err, FocasError::Connect { .. }));
    assert!(sim.calls().is_empty());
}

#[test]
fn closed_session_fails_with_connection_error() {
    let sim = SimulatedController::new();
    let session = open(&sim);
    session.close();

    let range = AddressRange::single(PmcArea::X, DataType::Byte, 0);
    let failures = [
        session.read_id().map(drop),
        session.read_range(range).map(drop),
        session.read_status().map(drop),
        session.select_main_program("//CNC_MEM/USER/PATH1/O1000"),
        session.cycle_start(),
    ];
    for result in failures {
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Connection);
    }
}

#[test]
fn select_code_five_reports_code_and_file_not_found() {
    let sim = SimulatedController::new();
    sim.fail_next(Function::SelectMainProgram, codes::EW_DATA);
    sim.set_detail(DetailedError::new(2));
    let session = open(&sim);

    let err = session
        .select_main_program("//CNC_MEM/USER/PATH1/O1000")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert_eq!(err.native_code(), Some(5));
    assert_eq!(err.detail().map(DetailedError::cause), Some(DetailCause::FileNotFound));
    let text = err.to_string();
    assert!(text.contains("native code 5"), "{text}");
    assert!(text.contains("file not found"), "{text}");
}

#[test]
fn detail_fetch_failure_reports_both_failures() {
    let sim = SimulatedController::new();
    sim.time_out_next(Function::GetDetailError);
    let session = open(&sim);

    let err = session
        .select_main_program("//CNC_MEM/USER/PATH1/O7777")
        .unwrap_err();
    assert_eq!(err.native_code(), Some(codes::EW_DATA));
    let source = std::error::Error::source(&err).map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("Communication timeout"));
    assert!(session.is_open());
}

#[test]
fn x7_byte_and_bits_agree() {
    let sim = SimulatedController::new();
    sim.set_bytes(PmcArea::X, 7, &[0b1100_0000]);
    let session = open(&sim);

    let range = AddressRange::new(PmcArea::X, DataType::Byte, 7, 7).unwrap();
    assert_eq!(session.read_range(range).unwrap(), vec![PmcValue::Byte(192)]);
    assert!(session.read_bit("X7.7".parse().unwrap()).unwrap());
    assert!(session.read_bit("X7.6".parse().unwrap()).unwrap());
    assert!(!session.read_bit("X7.5".parse().unwrap()).unwrap());

    sim.set_bytes(PmcArea::X, 7, &[0b1000_0000]);
    assert!(!session.read_bit("X7.6".parse().unwrap()).unwrap());
    assert!(session.read_bit("X7.7".parse().unwrap()).unwrap());
}

#[test]
fn wide_range_is_fragmented_and_reassembled_in_order() {
    let sim = SimulatedController::new();
    sim.set_max_transfer_bytes(16);
    let bytes: Vec<u8> = (0..40u8).collect();
    sim.set_bytes(PmcArea::F, 0, &bytes);

    let session = Session::open_with(
        SessionConfig::new("sim").with_max_transfer_bytes(16),
        |config| sim.connect(config),
    )
    .unwrap();
    let range = AddressRange::new(PmcArea::F, DataType::Byte, 0, 39).unwrap();
    let values = session.read_range(range).unwrap();

    assert!(sim.call_count(Function::ReadPmcRange) >= 2);
    assert_eq!(sim.call_count(Function::ReadPmcRange), 3);
    let expected: Vec<PmcValue> = bytes.into_iter().map(PmcValue::Byte).collect();
    assert_eq!(values, expected);
}

#[test]
fn oversized_call_without_fragmentation_is_a_protocol_error() {
    let sim = SimulatedController::new();
    sim.set_max_transfer_bytes(8);
    // The session cap is larger than what this controller accepts.
    let session = open(&sim);
    let range = AddressRange::new(PmcArea::D, DataType::Byte, 0, 15).unwrap();
    let err = session.read_range(range).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert_eq!(err.native_code(), Some(codes::EW_LENGTH));
}

#[test]
fn close_is_idempotent() {
    let sim = SimulatedController::new();
    let session = open(&sim);
    session.close();
    session.close();
    session.close();
    assert!(!session.is_open());
    drop(session);
    assert!(sim.is_closed());
}

#[test]
fn readers_requery_live_state() {
    let sim = SimulatedController::new();
    let session = open(&sim);

    sim.set_status(MachineStatus {
        tmmode: 1,
        ..Default::default()
    });
    assert!(session.read_status().unwrap().is_mdi());
    sim.set_status(MachineStatus {
        aut: 1,
        run: 3,
        ..Default::default()
    });
    let status = session.read_status().unwrap();
    assert!(status.is_auto());
    assert_eq!(status.run, 3);

    sim.set_positions(PositionSet {
        absolute: vec![1000, -2000],
        machine: vec![1500, -2500],
        relative: vec![0, 10],
        distance: vec![5, 0],
    });
    let positions = session.read_position().unwrap();
    assert_eq!(positions.axis_count(), 2);
    assert_eq!(positions.machine, vec![1500, -2500]);

    sim.set_spindle(SpindleInfo {
        feed: 1200,
        spindle: 3000,
    });
    assert_eq!(session.read_spindle().unwrap().spindle, 3000);

    sim.set_program_info(ProgramInfo {
        running: 1234,
        main: 1000,
    });
    assert_eq!(session.read_program_number().unwrap().running, 1234);
    assert_eq!(sim.call_count(Function::StatInfo), 2);
}

#[test]
fn select_then_verify_path() {
    let sim = SimulatedController::new();
    sim.add_program("//CNC_MEM/USER/PATH1/O2000");
    let session = open(&sim);

    let before = session.read_main_program_path().unwrap();
    assert_eq!(before, "//CNC_MEM/USER/PATH1/O1000");
    session.select_main_program("//CNC_MEM/USER/PATH1/O2000").unwrap();
    let after = session.read_main_program_path().unwrap();
    assert_ne!(before, after);
    assert_eq!(after, "//CNC_MEM/USER/PATH1/O2000");
}

#[test]
fn mdi_flow() {
    let sim = SimulatedController::new();
    let session = open(&sim);

    session.set_mode(OperationMode::Mdi).unwrap();
    session.write_mdi_program("G91 G01 X10. F500;").unwrap();
    session.cycle_start().unwrap();
    assert_eq!(sim.mdi_program().as_deref(), Some("G91 G01 X10. F500;"));
    assert_eq!(sim.cycle_starts(), 1);

    session.set_mode(OperationMode::Auto).unwrap();
    let err = session.write_mdi_program("G00 X0;").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert_eq!(err.native_code(), Some(codes::EW_MODE));
}

#[test]
fn link_codes_classify_as_connection() {
    let sim = SimulatedController::new();
    sim.fail_next(Function::ReadId, codes::EW_SOCKET);
    let session = open(&sim);
    let err = session.read_id().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(err.native_code(), Some(codes::EW_SOCKET));
}
