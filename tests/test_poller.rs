mod common;
use common::*;

use std::time::Duration;
use sunspec_bridge::poller::Poller;
use sunspec_bridge::snapshot_writer::SnapshotWriter;

#[tokio::test]
async fn publishes_snapshots_until_shutdown() -> Result<()> {
    common_setup();

    let config = Factory::config();
    let channels = Channels::new();
    let poller = Poller::new(config.clone(), channels.clone());
    let mut from_poller = channels.from_poller.subscribe();

    let device = config.device_with_name("boiler").unwrap();
    let sim = Factory::simulator();
    let endpoint = Endpoint::new(device.name(), sim.clone()).with_mode(device.read_mode());

    let handle = {
        let poller = poller.clone();
        let shutdown = channels.to_poller.subscribe();
        tokio::spawn(async move {
            poller
                .run(endpoint, Factory::dynamic_boiler(), Duration::from_millis(10), shutdown)
                .await
        })
    };

    let snapshot = match tokio::time::timeout(Duration::from_secs(5), from_poller.recv()).await?? {
        ChannelData::Snapshot(snapshot) => snapshot,
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(snapshot.device, "boiler");
    assert_eq!(snapshot.values["SetPoint"], 650);
    assert_eq!(snapshot.values["Energy"], 1234);

    poller.stop();
    tokio::time::timeout(Duration::from_secs(5), handle).await???;

    let stats = poller.shared_stats.lock().unwrap();
    assert!(stats.polls >= 1);
    assert_eq!(stats.polls, stats.good_polls);
    assert!(stats.snapshots_sent >= 1);
    Ok(())
}

#[tokio::test]
async fn failed_polls_are_counted_not_published() -> Result<()> {
    let config = Factory::config();
    let channels = Channels::new();
    let poller = Poller::new(config, channels.clone());
    let mut from_poller = channels.from_poller.subscribe();

    let sim = Factory::simulator();
    sim.inject_fault(0, Fault::Exception(0x02));
    let endpoint = Endpoint::new("boiler", sim.clone());

    let handle = {
        let poller = poller.clone();
        let shutdown = channels.to_poller.subscribe();
        tokio::spawn(async move {
            poller
                .run(endpoint, Factory::dynamic_boiler(), Duration::from_millis(5), shutdown)
                .await
        })
    };

    while poller.shared_stats.lock().unwrap().polls < 2 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    poller.stop();
    handle.await??;

    assert!(from_poller.try_recv().is_err());
    let stats = poller.shared_stats.lock().unwrap();
    assert_eq!(stats.good_polls, 0);
    assert_eq!(stats.failures[&StatusKind::DeviceFailure], stats.polls);
    assert!(stats.last_failures["boiler"].starts_with("DeviceFailure"));
    Ok(())
}

#[tokio::test]
async fn snapshots_reach_the_datalog_file() -> Result<()> {
    let file = tempfile::NamedTempFile::new()?;
    let writer = SnapshotWriter::new(file.path().to_str().unwrap())?;
    let channels = Channels::new();
    let poller = Poller::new(Factory::config(), channels.clone());

    let writer_handle = {
        let writer = writer.clone();
        let channels = channels.clone();
        tokio::spawn(async move { writer.start(channels).await })
    };
    while channels.from_poller.receiver_count() == 0 {
        tokio::task::yield_now().await;
    }

    let poll_handle = {
        let poller = poller.clone();
        let endpoint = Endpoint::new("boiler", Factory::simulator()).with_mode(ReadMode::block(40));
        let shutdown = channels.to_poller.subscribe();
        tokio::spawn(async move {
            poller
                .run(endpoint, Factory::dynamic_boiler(), Duration::from_millis(5), shutdown)
                .await
        })
    };

    while writer.snapshots_written() < 2 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    poller.stop();
    poll_handle.await??;
    channels.from_poller.send(ChannelData::Shutdown)?;
    writer_handle.await??;

    let contents = std::fs::read_to_string(file.path())?;
    let first: serde_json::Value = serde_json::from_str(contents.lines().next().unwrap())?;
    assert_eq!(first["device"], "boiler");
    assert_eq!(first["values"]["Address"], "192.168.1.100");
    Ok(())
}

#[tokio::test]
async fn stop_before_the_loop_starts_is_not_lost() -> Result<()> {
    let channels = Channels::new();
    let poller = Poller::new(Factory::config(), channels.clone());

    let shutdown = channels.to_poller.subscribe();
    poller.stop();

    let endpoint = Endpoint::new("boiler", Factory::simulator());
    tokio::time::timeout(
        Duration::from_secs(5),
        poller.run(endpoint, Factory::dynamic_boiler(), Duration::from_secs(3600), shutdown),
    )
    .await??;
    Ok(())
}

#[tokio::test]
async fn start_exits_on_an_early_stop() -> Result<()> {
    // boiler points at a closed local port; the first poll fails and the loop waits
    let yaml = Factory::config_yaml().replace(
        "host: 127.0.0.1",
        "host: 127.0.0.1\n    port: 1\n    read_timeout: 1",
    );
    let config = ConfigWrapper::from_config(Config::from_yaml(&yaml)?);
    let channels = Channels::new();
    let poller = Poller::new(config, channels);

    let handle = {
        let poller = poller.clone();
        tokio::spawn(async move { poller.start().await })
    };
    while poller.shared_stats.lock().unwrap().polls == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    poller.stop();
    tokio::time::timeout(Duration::from_secs(5), handle).await???;
    Ok(())
}
