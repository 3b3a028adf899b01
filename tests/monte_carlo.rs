use ballistic_mc::output::load_impact_csv;
use ballistic_mc::{
    mc_run, save_results, update_aimpoint, ManeuverMode, RunParams, RvType, SimError,
};

fn ensemble_params(name: &str) -> RunParams {
    RunParams {
        run_name: name.to_string(),
        num_runs: 6,
        seed: 42,
        time_step_main: 1.0,
        time_step_reentry: 0.1,
        rv_type: RvType::Ballistic,
        rv_maneuv: ManeuverMode::Ballistic,
        output_dir: std::env::temp_dir().join("ballistic_mc_tests").display().to_string(),
        ..RunParams::default()
    }
}

fn aimed(mut params: RunParams) -> RunParams {
    update_aimpoint(&mut params).unwrap();
    params
}

#[test]
fn test_no_errors_gives_identical_runs() {
    let params = aimed(ensemble_params("no_errors"));
    let results = mc_run(&params).unwrap();

    assert_eq!(results.impacts.len(), params.num_runs);
    assert_eq!(results.exhausted_runs, 0);
    let first = results.impacts[0];
    assert!(results.impacts.iter().all(|i| *i == first));
    assert!(results.cep(&params.aimpoint()).unwrap() < 1e-3);
}

#[test]
fn test_initial_position_error_spreads_impacts() {
    let params = aimed(RunParams {
        initial_pos_error: 100.0,
        ..ensemble_params("pos_error")
    });
    let results = mc_run(&params).unwrap();

    assert!(results.impacts[0] != results.impacts[1]);
    assert!(results.cep(&params.aimpoint()).unwrap() > 1e-3);
}

#[test]
fn test_cep_grows_with_error_magnitude() {
    let cep_for = |pos: f64, vel: f64, angle: f64| {
        let params = aimed(RunParams {
            initial_pos_error: pos,
            initial_vel_error: vel,
            initial_angle_error: angle,
            ..ensemble_params("growth")
        });
        mc_run(&params).unwrap().cep(&params.aimpoint()).unwrap()
    };

    let small = cep_for(10.0, 0.1, 1e-5);
    let large = cep_for(100.0, 1.0, 1e-4);
    assert!(small > 1e-3);
    assert!(large > small, "large {} vs small {}", large, small);
}

#[test]
fn test_atmosphere_error_disperses_ballistic_rv() {
    let params = aimed(RunParams {
        atm_error: true,
        ..ensemble_params("atm_ballistic")
    });
    let cep = mc_run(&params).unwrap().cep(&params.aimpoint()).unwrap();
    assert!(cep > 1e-3 && cep < 1e3, "CEP {}", cep);
}

#[test]
fn test_perfect_maneuver_removes_atmosphere_error() {
    let params = aimed(RunParams {
        atm_error: true,
        ins_nav: true,
        rv_type: RvType::Maneuverable,
        rv_maneuv: ManeuverMode::Perfect,
        ..ensemble_params("atm_perfect")
    });
    let cep = mc_run(&params).unwrap().cep(&params.aimpoint()).unwrap();
    assert!(cep < 1e-3, "CEP {}", cep);
}

#[test]
fn test_parallel_matches_sequential() {
    let sequential = RunParams {
        initial_pos_error: 50.0,
        initial_vel_error: 0.5,
        acc_scale_stability: 1e-5,
        gyro_noise: 1e-6,
        atm_error: true,
        ..ensemble_params("parallel")
    };
    let parallel = RunParams {
        parallel: true,
        ..sequential.clone()
    };

    let a = mc_run(&sequential).unwrap();
    let b = mc_run(&parallel).unwrap();
    assert_eq!(a.impacts, b.impacts);

    // Same seed reproduces the ensemble, a new seed does not
    assert_eq!(mc_run(&sequential).unwrap().impacts, a.impacts);
    let reseeded = RunParams { seed: 7, ..sequential };
    assert_ne!(mc_run(&reseeded).unwrap().impacts, a.impacts);
}

#[test]
fn test_results_written_to_run_directory() {
    let params = RunParams {
        num_runs: 2,
        initial_pos_error: 10.0,
        traj_output: true,
        ..ensemble_params("written")
    };
    let results = mc_run(&params).unwrap();
    let dir = save_results(&params, &results).unwrap();

    let loaded = load_impact_csv(dir.join("impact_data.csv")).unwrap();
    assert_eq!(loaded.len(), 2);
    assert!((loaded[0].t - results.impacts[0].t).abs() < 1e-6);
    assert!(dir.join("summary.json").exists());
    assert!(dir.join("trajectory_0.csv").exists());
    assert!(dir.join("trajectory_1.csv").exists());

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_run_ceiling_is_a_configuration_error() {
    let params = RunParams {
        num_runs: 1001,
        ..ensemble_params("too_many")
    };
    match mc_run(&params) {
        Err(SimError::TooManyRuns { requested, max }) => {
            assert_eq!(requested, 1001);
            assert_eq!(max, 1000);
        }
        other => panic!("expected TooManyRuns, got {:?}", other.map(|r| r.total_runs)),
    }
}
