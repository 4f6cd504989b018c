//! Fixture data used to seed empty storage and the credential directory.

use crate::{
  record::Record,
  user::{Role, User},
};

fn user(
  id: &str,
  username: &str,
  password: &str,
  role: Role,
  name: &str,
) -> User {
  User {
    id:       id.into(),
    username: username.into(),
    password: password.into(),
    role,
    name:     name.into(),
    email:    None,
    phone:    None,
    company:  None,
  }
}

pub fn users() -> Vec<User> {
  vec![
    user("admin1", "admin", "admin123", Role::Admin, "Admin User"),
    User {
      email: Some("vijay@student.com".into()),
      phone: Some("123-456-7890".into()),
      ..user("student1", "vijay", "vijay123", Role::Student, "VIJAY VINAYAK")
    },
    User {
      email: Some("hr@techcorp.com".into()),
      phone: Some("987-654-3210".into()),
      company: Some("Tech Corp".into()),
      ..user(
        "employer1",
        "employer",
        "employer123",
        Role::Employer,
        "Tech Corp",
      )
    },
    User {
      email: Some("officer@college.com".into()),
      phone: Some("555-555-5555".into()),
      ..user(
        "officer1",
        "officer",
        "officer123",
        Role::Officer,
        "Placement Officer",
      )
    },
  ]
}

/// Every seeded job was posted by `employer1` and is still open.
fn job(id: &str, title: &str, company: &str, location: &str) -> Record {
  Record::new(id)
    .with_status("active")
    .with_field("title", title)
    .with_field("company", company)
    .with_field("location", location)
    .with_field("postedBy", "employer1")
}

pub fn jobs() -> Vec<Record> {
  vec![
    job("job1", "Software Engineer", "Tech Corp", "Remote")
      .with_field("salary", "$80,000 - $100,000")
      .with_field("type", "Full-time")
      .with_field("description", "Looking for a talented software engineer...")
      .with_field(
        "requirements",
        "BS in Computer Science, 2+ years experience",
      )
      .with_field("postedDate", "2024-11-20"),
    job("job2", "Data Analyst", "Data Inc", "New York")
      .with_field("salary", "$70,000 - $90,000")
      .with_field("type", "Full-time")
      .with_field("description", "Seeking a data analyst to join our team...")
      .with_field("requirements", "BS in Statistics or related field")
      .with_field("postedDate", "2024-11-22"),
    job("job3", "UI/UX Designer", "Design Studio", "San Francisco")
      .with_field("salary", "$75,000 - $95,000")
      .with_field("type", "Contract")
      .with_field(
        "description",
        "Creative designer needed for exciting projects...",
      )
      .with_field("requirements", "Portfolio required, 3+ years experience")
      .with_field("postedDate", "2024-11-18"),
    job("job4", "APPLE", "APPLE", "INDIA")
      .with_field("salary", "$75,000 - $95,000")
      .with_field("type", "Contract")
      .with_field("description", "designer needed for exciting projects...")
      .with_field("requirements", "Portfolio required, 1+ years experience")
      .with_field("postedDate", "2024-11-18"),
  ]
}

fn application(
  id: &str,
  job_id: &str,
  student_id: &str,
  status: &str,
  applied: &str,
) -> Record {
  Record::new(id)
    .with_status(status)
    .with_field("jobId", job_id)
    .with_field("studentId", student_id)
    .with_field("appliedDate", applied)
}

pub fn applications() -> Vec<Record> {
  vec![
    application("app1", "job1", "student1", "pending", "2024-11-21")
      .with_field("resume", "resume.pdf")
      .with_field("coverLetter", "I am very interested..."),
    application("app2", "job2", "student1", "reviewed", "2024-11-23")
      .with_field("resume", "resume.pdf")
      .with_field("coverLetter", "I have strong analytical skills..."),
    application("app3", "job3", "student2", "pending", "2024-11-24")
      .with_field("resume", "resume2.pdf")
      .with_field(
        "coverLetter",
        "Design experience and portfolio available.",
      ),
    application("app4", "job1", "student3", "reviewed", "2024-11-25")
      .with_field("resume", "resume3.pdf")
      .with_field("coverLetter", "Looking forward to contributing."),
    application("app5", "job4", "student2", "accepted", "2024-11-26")
      .with_field("resume", "resume2.pdf")
      .with_field("coverLetter", "Eager to join this opportunity."),
  ]
}

fn student(id: &str, name: &str, email: &str, phone: &str) -> Record {
  Record::new(id)
    .with_status("active")
    .with_field("name", name)
    .with_field("email", email)
    .with_field("phone", phone)
}

pub fn students() -> Vec<Record> {
  vec![
    student("student1", "VIJAY VINAYAK", "vijay@student.com", "123-456-7890")
      .with_field("degree", "Computer Science")
      .with_field("year", "2024")
      .with_field("gpa", "3.8"),
    student("student2", "MOHITH SAI", "mohith@student.com", "123-456-7891")
      .with_field("degree", "Business Administration")
      .with_field("year", "2024")
      .with_field("gpa", "3.9"),
    student("student3", "BARGAV", "bargav@student.com", "123-456-7892")
      .with_field("degree", "Engineering")
      .with_field("year", "2025")
      .with_field("gpa", "3.7"),
  ]
}

fn employer(id: &str, name: &str, email: &str, phone: &str) -> Record {
  Record::new(id)
    .with_status("active")
    .with_field("name", name)
    .with_field("email", email)
    .with_field("phone", phone)
}

pub fn employers() -> Vec<Record> {
  vec![
    employer("employer1", "Tech Corp", "hr@techcorp.com", "987-654-3210")
      .with_field("industry", "Technology")
      .with_field("website", "www.techcorp.com"),
    employer("employer2", "Data Inc", "hr@datainc.com", "987-654-3211")
      .with_field("industry", "Data Analytics")
      .with_field("website", "www.datainc.com"),
  ]
}
