use chrono::NaiveDate;
use habit_core::{
    calendar::MonthCell,
    evaluate::RawValue,
    habit::{HabitType, NumericUpdate, ThresholdMode},
    ids::SequentialIdSource,
    storage::{FileStore, KeyValueStore, HABITS_KEY, LOGS_KEY},
    HabitService,
};
use tempfile::tempdir;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).expect("valid date")
}

fn open(dir: &std::path::Path) -> HabitService {
    HabitService::builder()
        .with_store(Box::new(FileStore::new(dir)))
        .with_id_source(Box::new(SequentialIdSource::new(dir.display().to_string())))
        .build()
}

#[test]
fn habits_logs_and_windows_across_restart() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path().join("state");

    let (water_id, lunch_id) = {
        let service = open(&root);
        let water = service
            .add_habit("Water", HabitType::Numeric)
            .expect("add water");
        service
            .update_numeric(
                &water.id,
                NumericUpdate {
                    unit: Some("glasses".into()),
                    threshold: Some(8.0),
                    threshold_mode: Some(ThresholdMode::AtLeast),
                    tolerance: None,
                },
            )
            .expect("configure water");
        let lunch = service
            .add_habit("Lunch", HabitType::MultiChoice)
            .expect("add lunch");
        service.add_option(&lunch.id).expect("add option");

        service
            .record(&water.id, day(14), RawValue::Number(8.0))
            .expect("record water 14");
        service
            .record(&water.id, day(15), RawValue::Number(7.9))
            .expect("record water 15");
        service
            .record(&lunch.id, day(15), RawValue::from_comma_list("Option 1, Option 2"))
            .expect("record lunch 15");
        service
            .record(&lunch.id, day(15), RawValue::from_comma_list(""))
            .expect("clear lunch 15");
        (water.id, lunch.id)
    };

    let store = FileStore::new(&root);
    assert!(store.load(HABITS_KEY).expect("read habits").is_some());
    assert!(store.load(LOGS_KEY).expect("read logs").is_some());

    let service = open(&root);
    assert_eq!(service.habits().len(), 2);
    assert_eq!(service.logs().len(), 3);
    assert!(!service.get_log(&lunch_id, day(15)).expect("lunch log").done);

    let snapshot = service.snapshot();
    let week = snapshot.week_window(day(15));
    assert_eq!(week.start, day(10));
    let counts: Vec<usize> = week.days.iter().map(|d| d.done_count).collect();
    assert_eq!(counts, vec![0, 0, 0, 0, 1, 0, 0]);

    let month = snapshot.month_window(day(15));
    assert_eq!(month.leading_blanks(), 5);
    assert_eq!(month.day_count(), 31);
    let completed: Vec<NaiveDate> = month
        .cells()
        .iter()
        .filter_map(|cell| match cell {
            MonthCell::Day { date, done_count } if *done_count > 0 => Some(*date),
            _ => None,
        })
        .collect();
    assert_eq!(completed, vec![day(14)]);

    let today = snapshot.day_window(day(15));
    let water_entry = today
        .entries
        .iter()
        .find(|entry| entry.habit.id == water_id)
        .expect("water entry");
    assert_eq!(
        water_entry.log.and_then(|log| log.value.as_ref()).and_then(|v| v.as_number()),
        Some(7.9)
    );
}

#[test]
fn corrupt_files_fall_back_to_empty_state() {
    let temp = tempdir().expect("tempdir");
    std::fs::write(temp.path().join("habits.json"), "[{\"broken\"").expect("write fixture");
    let service = open(temp.path());
    assert!(service.habits().is_empty());
    assert!(service.logs().is_empty());

    service
        .add_habit("Meditate", HabitType::Boolean)
        .expect("add after fallback");
    assert_eq!(open(temp.path()).habits().len(), 1);
}
