//! Drives the mock lamp through the `DeviceLink` trait object the
//! scheduler uses.

use std::sync::Arc;

use cube_core::{compile, DeviceLink};
use cube_driver_mock::errors::{OP_SEND_FRAME, OP_SET_POWER};
use cube_driver_mock::*;

#[tokio::test]
async fn test_plays_a_compiled_script_through_a_trait_object() {
    let lamp = Arc::new(MockCube::new());
    let link: Arc<dyn DeviceLink> = lamp.clone();
    let script = compile("stripes", "ROW 0 red\n\nROW 1 blue\n").unwrap();

    link.set_power(true).await.unwrap();
    link.enter_direct_mode().await.unwrap();
    for frame in script.frames() {
        link.show(frame).await.unwrap();
    }

    assert_eq!(lamp.matrices().unwrap(), script.frames());
    assert!(lamp.is_on());
}

#[tokio::test]
async fn test_frame_failures_do_not_change_power_state() {
    let lamp = MockCube::new().with_errors(ErrorConfig::scenario(ErrorScenario::FailAfterN {
        operation: OP_SEND_FRAME,
        count: 1,
    }));
    let frame = "A".repeat(100);

    lamp.set_power(true).await.unwrap();
    lamp.send_frame(&frame).await.unwrap();
    assert!(lamp.send_frame(&frame).await.is_err());
    assert!(lamp.is_on());
    assert_eq!(lamp.frame_count(), 1);
}

#[tokio::test]
async fn test_fail_after_zero_rejects_every_call() {
    let lamp = MockCube::new().with_errors(ErrorConfig::scenario(ErrorScenario::FailAfterN {
        operation: OP_SET_POWER,
        count: 0,
    }));
    assert!(lamp.set_power(true).await.is_err());
    lamp.error_config().reset();
    assert!(lamp.set_power(true).await.is_err());
    assert!(!lamp.is_on());
}
